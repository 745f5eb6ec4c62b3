// Data Models
pub mod config;
pub mod operation;
pub mod plan;

pub use config::{InstallerConfig, UiKind};
pub use operation::{InstallPhase, TaskOutcome};
pub use plan::{FilterMode, InstallPlan};
