use crate::utils::error::{InstallerError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// 파일 시스템 모듈
///
/// 설치/롤백에 필요한 복사, 이동, 삭제 작업
pub struct FileSystem;

impl FileSystem {
    /// 새 파일 시스템 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 디렉토리 트리 재귀 삭제
    ///
    /// 경로가 없으면 이미 삭제된 것으로 보고 `true`.
    /// 하위 항목 하나라도 삭제에 실패하면 그 자리에서 멈추고 `false`.
    #[allow(clippy::unused_self)]
    pub fn remove_tree(&self, path: &Path) -> bool {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return true,
            Err(_) => return false,
        };

        if !metadata.is_dir() {
            return false;
        }

        let Ok(read_dir) = fs::read_dir(path) else {
            return false;
        };

        for entry in read_dir {
            let Ok(entry) = entry else {
                return false;
            };
            let entry_path = entry.path();

            // 심볼릭 링크는 따라가지 않고 링크 자체만 삭제
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let removed = if is_dir {
                self.remove_tree(&entry_path)
            } else {
                fs::remove_file(&entry_path).is_ok()
            };
            if !removed {
                return false;
            }
        }

        fs::remove_dir(path).is_ok()
    }

    /// 파일이 없거나 삭제에 성공하면 `true`
    #[allow(clippy::unused_self)]
    pub fn remove_file_if_exists(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) => e.kind() == ErrorKind::NotFound,
        }
    }

    /// 빈 디렉토리만 삭제. 없으면 `true`, 비어 있지 않으면 그대로 두고 `false`
    #[allow(clippy::unused_self)]
    pub fn remove_empty_dir(&self, path: &Path) -> bool {
        match fs::remove_dir(path) {
            Ok(()) => true,
            Err(e) => e.kind() == ErrorKind::NotFound,
        }
    }

    /// 파일 복사 (대상이 있으면 덮어쓰기)
    ///
    /// 반환값: 복사된 바이트 수
    #[allow(clippy::unused_self)]
    pub fn copy_file(&self, src: &Path, dest: &Path) -> Result<u64> {
        if !src.is_file() {
            return Err(InstallerError::MissingInstallationFiles {
                path: src.to_path_buf(),
            });
        }

        fs::copy(src, dest).map_err(InstallerError::Io)
    }

    /// 디렉토리 이름 변경 (대상 디렉토리가 있으면 먼저 삭제)
    pub fn replace_directory(&self, src: &Path, dest: &Path) -> Result<()> {
        if !src.is_dir() {
            return Err(InstallerError::PromotionFailed {
                path: src.to_path_buf(),
                reason: "staging directory does not exist".to_string(),
            });
        }

        if dest.exists() && !self.remove_tree(dest) {
            return Err(InstallerError::PromotionFailed {
                path: dest.to_path_buf(),
                reason: "existing directory could not be replaced".to_string(),
            });
        }

        fs::rename(src, dest).map_err(|e| InstallerError::PromotionFailed {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
