use crate::core::state::{lock_state, EngineState};
use crate::core::tracker::TaskTracker;
use crate::system::filesystem::FileSystem;
use crate::ui::reporter::ProgressReporter;
use crate::utils::error::{InstallerError, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_ABORT_TIMEOUT: Duration = Duration::from_secs(5);

/// 설치 중단 및 롤백
///
/// 엔진 생성 시 함께 만들어지며, 엔진이 기록한 모든 흔적(스테이징 디렉토리,
/// 임시 아카이브 사본)을 지운다. 여러 번 호출해도 안전하다.
pub struct AbortController {
    state: Arc<Mutex<EngineState>>,
    tracker: Arc<TaskTracker>,
    reporter: Arc<dyn ProgressReporter>,
    join_timeout: Duration,
    fs: FileSystem,
}

impl AbortController {
    pub fn new(
        state: Arc<Mutex<EngineState>>,
        tracker: Arc<TaskTracker>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            state,
            tracker,
            reporter,
            join_timeout: DEFAULT_ABORT_TIMEOUT,
            fs: FileSystem::new(),
        }
    }

    pub fn set_join_timeout(&mut self, timeout: Duration) {
        self.join_timeout = timeout;
    }

    pub fn rollback(&self) -> Result<()> {
        let (run_token, archive, extraction_root, staging_dir, temp_archive, created_dirs) = {
            let mut state = lock_state(&self.state);
            (
                state.run_token.clone(),
                state.archive.take(),
                state.extraction_root.clone(),
                state.staging_dir.clone(),
                state.temp_archive.clone(),
                std::mem::take(&mut state.created_dirs),
            )
        };

        if let Some(token) = &run_token {
            token.cancel();
        }

        let mut outstanding = 0;
        if !self.tracker.wait_timeout(self.join_timeout) {
            outstanding = self.tracker.outstanding();
            tracing::warn!(
                outstanding,
                timeout_secs = self.join_timeout.as_secs_f32(),
                "extraction tasks did not stop in time, cleaning up anyway"
            );
            self.reporter.log(&format!(
                "{} TASK(S) DID NOT STOP IN TIME, CLEANING UP ANYWAY",
                outstanding
            ));
        }

        drop(archive);

        let mut failed = Vec::new();
        if let Some(dir) = &staging_dir {
            if !self.fs.remove_tree(dir) {
                failed.push(dir.clone());
            }
        }
        if let Some(file) = &temp_archive {
            if !self.fs.remove_file_if_exists(file) {
                failed.push(file.clone());
            }
        }

        if failed.is_empty() {
            // 설치 전에 없던 추출 위치는 비어 있을 때만 지운다
            for dir in &created_dirs {
                if !self.fs.remove_empty_dir(dir) {
                    tracing::debug!(path = %dir.display(), "extraction directory kept, not empty");
                    break;
                }
            }

            if outstanding > 0 {
                tracing::warn!(outstanding, "installation aborted, cleanup was best-effort");
                self.reporter
                    .log("INSTALLATION ABORTED, CLEANUP WAS BEST-EFFORT");
                if let Some(root) = &extraction_root {
                    self.reporter.log(&format!(
                        "CHECK: [{}] FOR UNWANTED FILES.",
                        root.display()
                    ));
                }
            } else {
                tracing::info!("installation aborted cleanly");
                self.reporter.log("INSTALLATION ABORTED CLEANLY");
            }
            return Ok(());
        }

        let check_path: PathBuf = extraction_root
            .or(staging_dir)
            .unwrap_or_else(|| failed[0].clone());
        let reason = failed
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::error!(path = %check_path.display(), %reason, "installation did not abort cleanly");
        self.reporter.log("INSTALLATION DID NOT ABORT CLEANLY");
        self.reporter.log(&format!(
            "CHECK: [{}] FOR UNWANTED FILES.",
            check_path.display()
        ));

        Err(InstallerError::RollbackFailed {
            path: check_path,
            reason: format!("could not remove {}", reason),
        })
    }
}
