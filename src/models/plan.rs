//! 설치 계획 모델
//!
//! 설치 시작 시점에 고정되는 경로/필터 정보

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// 스테이징 폴더 이름 접두사 (숨김 폴더)
pub const STAGING_PREFIX: char = '.';

/// 아카이브 엔트리 필터 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// 접두사로 시작하는 엔트리만 설치
    #[default]
    IncludeOnly,
    /// 접두사로 시작하는 엔트리 제외
    Exclude,
    /// 전체 설치
    All,
}

impl FilterMode {
    pub fn name(&self) -> &'static str {
        match self {
            FilterMode::IncludeOnly => "include-only",
            FilterMode::Exclude => "exclude",
            FilterMode::All => "all",
        }
    }

    /// `/` 정규화된 엔트리 이름이 필터를 통과하는지 확인
    pub fn accepts(&self, entry_name: &str, prefix: &str) -> bool {
        match self {
            FilterMode::IncludeOnly => entry_name.starts_with(prefix),
            FilterMode::Exclude => !entry_name.starts_with(prefix),
            FilterMode::All => true,
        }
    }
}

/// 설치 계획
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub archive_path: PathBuf,
    pub extraction_root: PathBuf,
    pub extraction_name: String,
    pub source_folder: String,
    pub filter: FilterMode,
    pub filter_prefix: String,
}

impl InstallPlan {
    /// 설치 중 사용하는 폴더 이름
    pub fn staging_name(&self) -> &str {
        &self.extraction_name
    }

    /// 설치 완료 후 공개되는 폴더 이름
    ///
    /// 스테이징 이름이 `.`으로 시작하면 접두사를 뗀 이름, 아니면 동일
    pub fn public_name(&self) -> &str {
        public_name_of(&self.extraction_name)
    }

    pub fn uses_staging_name(&self) -> bool {
        self.staging_name() != self.public_name()
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.extraction_root.join(self.staging_name())
    }

    pub fn public_dir(&self) -> PathBuf {
        self.extraction_root.join(self.public_name())
    }

    /// 엔트리가 풀리는 기준 디렉토리 (`<root>/<staging>/<source>`)
    pub fn entries_dir(&self) -> PathBuf {
        let staging = self.staging_dir();
        if self.source_folder.is_empty() {
            staging
        } else {
            staging.join(&self.source_folder)
        }
    }

    /// 승격 시 아카이브 사본 이름 (`run.<ext>`)
    pub fn promoted_archive_name(&self) -> String {
        format!("run.{}", archive_extension(&self.archive_path))
    }
}

/// 스테이징 이름에서 공개 이름 계산 (`.app` → `app`)
pub fn public_name_of(name: &str) -> &str {
    name.strip_prefix(STAGING_PREFIX)
        .filter(|public| !public.is_empty())
        .unwrap_or(name)
}

/// 구분자나 `.`/`..`, 루트 없이 하나의 폴더/파일 이름인지 확인
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn archive_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "jar".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan(name: &str) -> InstallPlan {
        InstallPlan {
            archive_path: PathBuf::from("/bundle/textgame.jar"),
            extraction_root: PathBuf::from("/home/user/Desktop"),
            extraction_name: name.to_string(),
            source_folder: "src".to_string(),
            filter: FilterMode::IncludeOnly,
            filter_prefix: "files".to_string(),
        }
    }

    #[test]
    fn test_filter_mode_accepts() {
        assert!(FilterMode::IncludeOnly.accepts("files/a.txt", "files/"));
        assert!(!FilterMode::IncludeOnly.accepts("other/b.txt", "files/"));
        assert!(!FilterMode::Exclude.accepts("files/a.txt", "files/"));
        assert!(FilterMode::Exclude.accepts("other/b.txt", "files/"));
        assert!(FilterMode::All.accepts("anything", "files/"));
    }

    #[test]
    fn test_staging_and_public_names() {
        let plan = sample_plan(".textgame");
        assert_eq!(plan.staging_name(), ".textgame");
        assert_eq!(plan.public_name(), "textgame");
        assert!(plan.uses_staging_name());
        assert_eq!(plan.public_dir(), PathBuf::from("/home/user/Desktop/textgame"));

        let plain = sample_plan("textgame");
        assert_eq!(plain.public_name(), "textgame");
        assert!(!plain.uses_staging_name());

        // "." 단독은 공개 이름으로 바꿀 수 없음
        let dot_only = sample_plan(".");
        assert_eq!(dot_only.public_name(), ".");
    }

    #[test]
    fn test_is_plain_name() {
        assert!(is_plain_name(".textgame"));
        assert!(is_plain_name("textgame"));
        assert!(is_plain_name(".installation"));

        assert!(!is_plain_name(""));
        assert!(!is_plain_name("."));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("/abs"));
        assert!(!is_plain_name("a/../.."));
        assert!(!is_plain_name("games/textgame"));
        assert!(!is_plain_name("./textgame"));
    }

    #[test]
    fn test_entries_dir_and_promoted_name() {
        let plan = sample_plan(".textgame");
        assert_eq!(
            plan.entries_dir(),
            PathBuf::from("/home/user/Desktop/.textgame/src")
        );
        assert_eq!(plan.promoted_archive_name(), "run.jar");

        let mut zip_plan = sample_plan(".textgame");
        zip_plan.archive_path = PathBuf::from("bundle.ZIP");
        zip_plan.source_folder = String::new();
        assert_eq!(zip_plan.promoted_archive_name(), "run.zip");
        assert_eq!(
            zip_plan.entries_dir(),
            PathBuf::from("/home/user/Desktop/.textgame")
        );
    }
}
