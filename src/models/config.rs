//! 설치 프로그램 설정
//!
//! `config.toml`에서 읽으며 모든 항목은 기본값을 가진다.

use crate::models::plan::FilterMode;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR_NAME: &str = "bundle-installer";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// 진행 상황 표시 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UiKind {
    /// 콘솔 출력
    #[default]
    Plain,
    /// 전체 화면 터미널 UI
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub archive: PathBuf,
    pub extraction_dir: Option<PathBuf>,
    pub extraction_name: String,
    pub source_folder: String,
    pub temp_archive_name: String,
    pub filter: FilterMode,
    pub filter_prefix: String,
    pub ui: UiKind,
    pub abort_timeout_secs: u64,
    pub assume_yes: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            archive: PathBuf::from("bundle.jar"),
            extraction_dir: None,
            extraction_name: ".app".to_string(),
            source_folder: "src".to_string(),
            temp_archive_name: ".installation".to_string(),
            filter: FilterMode::IncludeOnly,
            filter_prefix: "files".to_string(),
            ui: UiKind::Plain,
            abort_timeout_secs: 5,
            assume_yes: false,
        }
    }
}

impl InstallerConfig {
    /// TOML 파일에서 설정 로드
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: InstallerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 명시 경로 또는 설정 디렉토리의 `config.toml` 로드
    ///
    /// 명시 경로가 없고 기본 파일도 없으면 기본값 사용
    pub fn load(explicit: Option<&Path>) -> Result<Self, anyhow::Error> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// 설치 루트 디렉토리 (미지정 시 바탕화면, 없으면 홈)
    pub fn resolved_extraction_dir(&self) -> Option<PathBuf> {
        self.extraction_dir
            .clone()
            .or_else(dirs::desktop_dir)
            .or_else(dirs::home_dir)
    }

    pub fn abort_timeout(&self) -> Duration {
        Duration::from_secs(self.abort_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// 터미널 UI 모드의 로그 파일 경로
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME).join("install.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = InstallerConfig::default();
        assert_eq!(config.extraction_name, ".app");
        assert_eq!(config.source_folder, "src");
        assert_eq!(config.temp_archive_name, ".installation");
        assert_eq!(config.filter, FilterMode::IncludeOnly);
        assert_eq!(config.abort_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "archive = \"textgame.jar\"\nextraction_name = \".textgame\"\nfilter = \"exclude\"\nui = \"terminal\"\n",
        )
        .expect("write config");

        let config = InstallerConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.archive, PathBuf::from("textgame.jar"));
        assert_eq!(config.extraction_name, ".textgame");
        assert_eq!(config.filter, FilterMode::Exclude);
        assert_eq!(config.ui, UiKind::Terminal);
        assert_eq!(config.filter_prefix, "files");
        assert_eq!(config.abort_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "filter = \"sometimes\"\n").expect("write config");
        assert!(InstallerConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_explicit_extraction_dir_wins() {
        let config = InstallerConfig {
            extraction_dir: Some(PathBuf::from("/opt/games")),
            ..InstallerConfig::default()
        };
        assert_eq!(
            config.resolved_extraction_dir(),
            Some(PathBuf::from("/opt/games"))
        );
    }
}
