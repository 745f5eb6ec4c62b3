// Core Layer
pub mod abort;
pub mod cancel;
pub mod engine;
pub mod state;
pub mod task;
pub mod tracker;

pub use cancel::CancellationToken;
pub use engine::ExtractionEngine;
