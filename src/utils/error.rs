use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// 사용자가 설치 시작을 거부함
    #[error("Installation declined by user")]
    Declined,

    #[error("Missing files required for installation: {path}")]
    MissingInstallationFiles { path: PathBuf },

    #[error("Failed to open archive {path}: {reason}")]
    ArchiveOpenFailed { path: PathBuf, reason: String },

    #[error("Archive entry escapes the extraction directory: {entry}")]
    UnsafeEntryPath { entry: String },

    /// 스테이징 이름을 쓰지 않는 설치가 기존 폴더에 쓰려 함
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Could not clear leftover staging directory {path}")]
    StaleStagingDir { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to install {entry}: {source}")]
    ExtractFailed {
        entry: String,
        source: std::io::Error,
    },

    #[error("Failed to finalize installation at {path}: {reason}")]
    PromotionFailed { path: PathBuf, reason: String },

    /// 취소는 오류가 아닌 정상 종료 경로 (롤백 완료)
    #[error("Installation cancelled")]
    Cancelled,

    #[error("Installation did not abort cleanly, check {path} for unwanted files ({reason})")]
    RollbackFailed { path: PathBuf, reason: String },
}

impl InstallerError {
    /// 사용자에게 오류 대화 없이 조용히 끝내야 하는 경우
    pub fn is_silent(&self) -> bool {
        matches!(self, InstallerError::Declined)
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;
