// System Layer
pub mod archive;
pub mod filesystem;
pub mod path_planner;

pub use archive::{ArchiveEntry, InstallArchive};
pub use filesystem::FileSystem;
