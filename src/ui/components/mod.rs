// UI Components
pub mod install_screen;

pub use install_screen::{InstallScreen, InstallView, ScreenMode};
