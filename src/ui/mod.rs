// UI Layer
pub mod components;
pub mod plain;
pub mod reporter;
pub mod terminal;

pub use plain::PlainReporter;
pub use reporter::ProgressReporter;
pub use terminal::TerminalReporter;
