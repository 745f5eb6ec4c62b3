use crate::core::cancel::CancellationToken;
use crate::core::tracker::TaskTracker;
use crate::models::operation::TaskOutcome;
use crate::system::archive::{ArchiveEntry, InstallArchive};
use crate::ui::reporter::ProgressReporter;
use crate::utils::error::InstallerError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// 이 바이트 수를 넘길 때마다 퍼센트 문구 갱신
pub const PROGRESS_QUANTUM: u64 = 10_000;

const CHUNK_SIZE: usize = 8 * 1024;

/// 아카이브 엔트리 하나를 대상 경로에 기록하는 작업 단위
pub struct ExtractionTask {
    entry: ArchiveEntry,
    destination: PathBuf,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
    tracker: Arc<TaskTracker>,
}

impl ExtractionTask {
    pub fn new(
        entry: ArchiveEntry,
        destination: PathBuf,
        reporter: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
        tracker: Arc<TaskTracker>,
    ) -> Self {
        Self {
            entry,
            destination,
            reporter,
            cancel,
            tracker,
        }
    }

    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    /// 작업 스레드 본문
    ///
    /// 결과와 상관없이 트래커 카운트를 정확히 한 번 줄인다.
    /// 실패하면 오류를 트래커에 남기고 다른 작업에 취소를 알린다.
    pub fn run(self, archive: &mut InstallArchive) -> TaskOutcome {
        let _guard = self.tracker.guard(&self.entry.name);

        match self.extract(archive) {
            Ok(TaskOutcome::Completed) => {
                self.reporter
                    .log(&format!("INSTALLING {}", self.entry.name));
                self.reporter.increment_progress(1);
                TaskOutcome::Completed
            }
            Ok(TaskOutcome::Cancelled) => {
                self.reporter
                    .log(&format!("CANCELLING {}", self.entry.name));
                TaskOutcome::Cancelled
            }
            Ok(TaskOutcome::Failed) => TaskOutcome::Failed,
            Err(error) => {
                tracing::error!(entry = %self.entry.name, %error, "extraction task failed");
                self.tracker.record_failure(error);
                self.cancel.cancel();
                TaskOutcome::Failed
            }
        }
    }

    fn extract(&self, archive: &mut InstallArchive) -> Result<TaskOutcome, InstallerError> {
        if self.cancel.is_cancelled() {
            return Ok(TaskOutcome::Cancelled);
        }

        if self.entry.is_dir {
            fs::create_dir_all(&self.destination).map_err(|e| self.failed(e))?;
            return Ok(TaskOutcome::Completed);
        }

        archive
            .read_entry(&self.entry, |reader| self.copy_stream(reader))
            .map_err(|e| self.failed(e))
    }

    fn copy_stream(&self, reader: &mut dyn Read) -> io::Result<TaskOutcome> {
        let label = format!("INSTALLING {}", self.entry.name);
        let mut writer = BufWriter::new(File::create(&self.destination)?);
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut bytes_read = 0u64;
        let mut outcome = TaskOutcome::Completed;

        loop {
            if self.cancel.is_cancelled() {
                outcome = TaskOutcome::Cancelled;
                break;
            }

            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            writer.write_all(&buffer[..read])?;

            let previous_quantum = bytes_read / PROGRESS_QUANTUM;
            bytes_read += read as u64;
            if bytes_read / PROGRESS_QUANTUM > previous_quantum {
                self.reporter.set_text(&format!(
                    "{} {}%",
                    label,
                    percent(bytes_read, self.entry.size)
                ));
            }
        }

        // 취소된 경우에도 기록한 부분은 닫는다 (롤백에서 삭제)
        writer.flush()?;
        Ok(outcome)
    }

    fn failed(&self, source: io::Error) -> InstallerError {
        InstallerError::ExtractFailed {
            entry: self.entry.name.clone(),
            source,
        }
    }
}

fn percent(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100)
}
