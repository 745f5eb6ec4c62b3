//! 설치 엔진
//!
//! 아카이브 엔트리를 나열/필터링하고 엔트리마다 추출 작업 스레드를 띄운 뒤,
//! 모든 작업이 끝나면 스테이징 디렉토리를 공개 이름으로 승격한다.
//! 실패나 취소 시에는 `AbortController`로 설치 전 상태로 되돌린다.

use crate::core::abort::AbortController;
use crate::core::cancel::CancellationToken;
use crate::core::state::{lock_state, EngineState};
use crate::core::task::ExtractionTask;
use crate::core::tracker::{TaskTracker, WaitOutcome};
use crate::models::operation::{InstallPhase, TaskOutcome};
use crate::models::plan::{is_plain_name, public_name_of, FilterMode, InstallPlan};
use crate::system::archive::InstallArchive;
use crate::system::filesystem::FileSystem;
use crate::system::path_planner::{self, PlannedPath};
use crate::ui::reporter::ProgressReporter;
use crate::utils::error::{InstallerError, Result};
use crate::utils::formatter::format_file_size;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_TEMP_ARCHIVE_NAME: &str = ".installation";
pub const DEFAULT_SOURCE_FOLDER: &str = "src";

pub struct ExtractionEngine {
    archive_path: PathBuf,
    extraction_dir: Option<PathBuf>,
    extraction_name: Option<String>,
    source_folder: String,
    temp_archive_name: String,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
    tracker: Arc<TaskTracker>,
    state: Arc<Mutex<EngineState>>,
    abort: AbortController,
    fs: FileSystem,
}

impl ExtractionEngine {
    /// `cancel`은 프로세스 신호 처리 계층이 설치를 중단할 때 사용하는 토큰
    pub fn new(
        archive_path: impl Into<PathBuf>,
        reporter: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
    ) -> Self {
        let state = Arc::new(Mutex::new(EngineState::default()));
        let tracker = Arc::new(TaskTracker::new());
        let abort = AbortController::new(
            Arc::clone(&state),
            Arc::clone(&tracker),
            Arc::clone(&reporter),
        );

        Self {
            archive_path: archive_path.into(),
            extraction_dir: None,
            extraction_name: None,
            source_folder: DEFAULT_SOURCE_FOLDER.to_string(),
            temp_archive_name: DEFAULT_TEMP_ARCHIVE_NAME.to_string(),
            reporter,
            cancel,
            tracker,
            state,
            abort,
            fs: FileSystem::new(),
        }
    }

    pub fn set_extraction_dir(&mut self, dir: impl Into<PathBuf>) {
        self.extraction_dir = Some(dir.into());
    }

    /// `.`으로 시작하면 설치 중에는 숨김 이름을 쓰고 완료 후 접두사를 뗀 이름으로 바꾼다.
    pub fn set_extraction_name(&mut self, name: &str) {
        self.extraction_name = Some(trim_separators(name).to_string());
    }

    pub fn set_source_folder(&mut self, folder: &str) {
        self.source_folder = trim_separators(folder).to_string();
    }

    pub fn set_temp_archive_name(&mut self, name: &str) {
        self.temp_archive_name = trim_separators(name).to_string();
    }

    pub fn set_abort_timeout(&mut self, timeout: Duration) {
        self.abort.set_join_timeout(timeout);
    }

    pub fn phase(&self) -> InstallPhase {
        self.lock_state().phase
    }

    pub fn abort_controller(&self) -> &AbortController {
        &self.abort
    }

    pub fn temp_archive_path(&self) -> Option<PathBuf> {
        if !is_plain_name(&self.temp_archive_name) {
            return None;
        }
        self.extraction_dir
            .as_ref()
            .map(|dir| dir.join(&self.temp_archive_name))
    }

    /// 설치 실행 (완료 또는 실패까지 블록)
    pub fn install(&mut self, filter: FilterMode, filter_prefix: &str) -> Result<()> {
        if self.phase() != InstallPhase::Idle {
            return Err(InstallerError::Config(
                "installation has already been started by this installer".to_string(),
            ));
        }
        self.set_phase(InstallPhase::Planning);

        if !self.reporter.display() {
            self.set_phase(InstallPhase::Aborted);
            return Err(InstallerError::Declined);
        }

        let plan = match self.build_plan(filter, filter_prefix) {
            Ok(plan) => plan,
            Err(error) => {
                self.set_phase(InstallPhase::Aborted);
                return Err(error);
            }
        };

        if !plan.archive_path.is_file() {
            self.set_phase(InstallPhase::Aborted);
            return Err(InstallerError::MissingInstallationFiles {
                path: plan.archive_path.clone(),
            });
        }

        // 스테이징 이름이 없으면 롤백이 이 폴더를 지운다
        if !plan.uses_staging_name() && plan.staging_dir().exists() {
            self.set_phase(InstallPhase::Aborted);
            return Err(InstallerError::DestinationExists {
                path: plan.staging_dir(),
            });
        }

        let run_token = self.cancel.child_token();
        let temp_archive = plan.extraction_root.join(&self.temp_archive_name);
        {
            let mut state = self.lock_state();
            state.run_token = Some(run_token.clone());
            state.extraction_root = Some(plan.extraction_root.clone());
            state.staging_dir = Some(plan.staging_dir());
            state.temp_archive = Some(temp_archive.clone());
        }

        tracing::info!(
            archive = %plan.archive_path.display(),
            staging = %plan.staging_dir().display(),
            filter = plan.filter.name(),
            prefix = %plan.filter_prefix,
            "starting installation"
        );

        match self.run(&plan, &temp_archive, &run_token) {
            Ok(()) => Ok(()),
            Err(error) => Err(self.abort_install(error)),
        }
    }

    /// 사용자가 UI를 닫은 뒤 임시 아카이브 사본 삭제
    pub fn finish(&self) -> bool {
        if !self.phase().is_terminal() {
            tracing::warn!(phase = self.phase().name(), "finish called before installation ended");
            return false;
        }
        let Some(temp_archive) = self.temp_archive_path() else {
            return true;
        };
        let removed = self.fs.remove_file_if_exists(&temp_archive);
        if removed {
            self.lock_state().temp_archive = None;
        } else {
            tracing::warn!(path = %temp_archive.display(), "temporary archive copy was not removed");
        }
        removed
    }

    fn run(
        &mut self,
        plan: &InstallPlan,
        temp_archive: &Path,
        run_token: &CancellationToken,
    ) -> Result<()> {
        let created_dirs: Vec<PathBuf> = plan
            .extraction_root
            .ancestors()
            .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
            .map(Path::to_path_buf)
            .collect();
        self.lock_state().created_dirs = created_dirs;
        fs::create_dir_all(&plan.extraction_root).map_err(|e| {
            InstallerError::DirectoryCreationFailed {
                path: plan.extraction_root.clone(),
                source: e,
            }
        })?;

        let staging_dir = plan.staging_dir();
        if plan.uses_staging_name() && staging_dir.exists() {
            tracing::warn!(path = %staging_dir.display(), "removing leftover staging directory");
            if !self.fs.remove_tree(&staging_dir) {
                return Err(InstallerError::StaleStagingDir { path: staging_dir });
            }
        }

        let copied = self.fs.copy_file(&plan.archive_path, temp_archive)?;
        tracing::debug!(
            path = %temp_archive.display(),
            size = %format_file_size(copied),
            "archive copied"
        );

        let mut archive = InstallArchive::open(temp_archive)?;
        if archive.is_empty() {
            tracing::warn!(path = %archive.path().display(), "archive has no entries");
        }
        let entries = archive.entries()?;

        let mut tasks = Vec::new();
        for entry in entries {
            if run_token.is_cancelled() {
                return Err(self.cancellation_error());
            }
            let destination = match path_planner::plan(&entry.name, plan)? {
                PlannedPath::Write(destination) => destination,
                PlannedPath::Skip => {
                    tracing::debug!(entry = %entry.name, "entry filtered out");
                    continue;
                }
            };
            path_planner::ensure_parents(&destination)?;
            tracing::debug!(entry = %entry.name, destination = %destination.display(), "entry planned");
            tasks.push(ExtractionTask::new(
                entry,
                destination,
                Arc::clone(&self.reporter),
                run_token.clone(),
                Arc::clone(&self.tracker),
            ));
        }

        self.lock_state().archive = Some(archive.clone());
        self.reporter.set_maximum_progress(tasks.len() + 1);
        self.set_phase(InstallPhase::Running);

        let task_count = tasks.len();
        self.tracker.start(task_count);
        let handles = self.spawn_tasks(tasks, &archive, run_token);
        tracing::info!(
            tasks = task_count,
            entries = archive.len(),
            "extraction tasks started"
        );

        if self.tracker.wait(run_token) == WaitOutcome::Cancelled || run_token.is_cancelled() {
            return Err(self.cancellation_error());
        }

        let completed = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter(|outcome| *outcome == TaskOutcome::Completed)
            .count();
        if let Some(failure) = self.tracker.take_failure() {
            return Err(failure);
        }
        tracing::debug!(completed, "all extraction tasks finished");

        drop(archive);
        self.lock_state().archive = None;

        self.promote(plan, temp_archive, run_token)
    }

    fn spawn_tasks(
        &self,
        tasks: Vec<ExtractionTask>,
        archive: &InstallArchive,
        run_token: &CancellationToken,
    ) -> Vec<JoinHandle<TaskOutcome>> {
        let total = tasks.len();
        let mut handles = Vec::with_capacity(total);

        for task in tasks {
            let mut task_archive = archive.clone();
            let entry_name = task.entry().name.clone();
            let spawned = thread::Builder::new()
                .name(format!("extract {}", entry_name))
                .spawn(move || task.run(&mut task_archive));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    self.tracker.record_failure(InstallerError::ExtractFailed {
                        entry: entry_name,
                        source: e,
                    });
                    run_token.cancel();
                    // 시작하지 못한 작업 몫은 여기서 배리어를 풀어준다
                    for _ in handles.len()..total {
                        self.tracker.complete_one();
                    }
                    break;
                }
            }
        }

        handles
    }

    fn promote(
        &self,
        plan: &InstallPlan,
        temp_archive: &Path,
        run_token: &CancellationToken,
    ) -> Result<()> {
        self.set_phase(InstallPhase::Promoting);
        if run_token.is_cancelled() {
            return Err(self.cancellation_error());
        }

        let staging_dir = plan.staging_dir();
        fs::create_dir_all(&staging_dir).map_err(|e| InstallerError::DirectoryCreationFailed {
            path: staging_dir.clone(),
            source: e,
        })?;

        let promoted_name = plan.promoted_archive_name();
        self.reporter
            .log(&format!("INSTALLING ARCHIVE: {}", promoted_name));
        self.fs
            .copy_file(temp_archive, &staging_dir.join(&promoted_name))?;

        if run_token.is_cancelled() {
            return Err(self.cancellation_error());
        }

        if plan.uses_staging_name() {
            self.fs
                .replace_directory(&staging_dir, &plan.public_dir())?;
        }

        // 승격 이후에는 롤백 대상이 아님
        {
            let mut state = self.lock_state();
            state.staging_dir = None;
            state.run_token = None;
            state.created_dirs.clear();
        }

        self.reporter.increment_progress(1);
        self.set_phase(InstallPhase::Done);
        tracing::info!(destination = %plan.public_dir().display(), "installation finished");
        self.reporter.log("INSTALLATION FINISHED");
        self.reporter.set_finishable(true);
        Ok(())
    }

    fn abort_install(&self, error: InstallerError) -> InstallerError {
        if !self.phase().can_abort() {
            return error;
        }
        self.set_phase(InstallPhase::Cancelling);
        match &error {
            InstallerError::Cancelled => {
                tracing::info!("installation cancelled, rolling back");
                self.reporter.log("CANCELLING INSTALLATION");
            }
            other => {
                tracing::error!(error = %other, "installation failed, rolling back");
                self.reporter.log(&format!("INSTALLATION FAILED: {}", other));
            }
        }

        let rollback = self.abort.rollback();
        self.set_phase(InstallPhase::Aborted);

        match rollback {
            Ok(()) => error,
            Err(InstallerError::RollbackFailed { path, reason }) => InstallerError::RollbackFailed {
                path,
                reason: format!("{}; {}", error, reason),
            },
            Err(other) => other,
        }
    }

    fn cancellation_error(&self) -> InstallerError {
        self.tracker
            .take_failure()
            .unwrap_or(InstallerError::Cancelled)
    }

    fn build_plan(&self, filter: FilterMode, filter_prefix: &str) -> Result<InstallPlan> {
        let extraction_root = self.extraction_dir.clone().ok_or_else(|| {
            InstallerError::Config("extraction directory is not set".to_string())
        })?;
        let extraction_name = self
            .extraction_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| InstallerError::Config("extraction folder name is not set".to_string()))?;

        if !is_plain_name(&extraction_name) || !is_plain_name(public_name_of(&extraction_name)) {
            return Err(InstallerError::Config(format!(
                "extraction folder name must be a single folder name: {:?}",
                extraction_name
            )));
        }
        if !self.source_folder.is_empty() && !is_plain_name(&self.source_folder) {
            return Err(InstallerError::Config(format!(
                "source folder must be a single folder name: {:?}",
                self.source_folder
            )));
        }
        if !is_plain_name(&self.temp_archive_name) {
            return Err(InstallerError::Config(format!(
                "temporary archive name must be a single file name: {:?}",
                self.temp_archive_name
            )));
        }
        if self.temp_archive_name == extraction_name
            || self.temp_archive_name == public_name_of(&extraction_name)
        {
            return Err(InstallerError::Config(format!(
                "temporary archive name {:?} collides with the extraction folder",
                self.temp_archive_name
            )));
        }

        Ok(InstallPlan {
            archive_path: self.archive_path.clone(),
            extraction_root,
            extraction_name,
            source_folder: self.source_folder.clone(),
            filter,
            filter_prefix: filter_prefix.to_string(),
        })
    }

    fn set_phase(&self, phase: InstallPhase) {
        let mut state = self.lock_state();
        if state.phase != phase {
            tracing::debug!(from = state.phase.name(), to = phase.name(), "install phase changed");
            state.phase = phase;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        lock_state(&self.state)
    }
}

fn trim_separators(name: &str) -> &str {
    name.trim_end_matches(['/', '\\'])
}
