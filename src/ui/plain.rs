//! 콘솔 출력 리포터
//!
//! 로그 줄을 진행 카운터와 함께 표준 출력에 쓰고, 시작 확인은 표준 입력으로 받는다.

use crate::ui::reporter::ProgressReporter;
use crate::utils::formatter::format_progress;
use crate::utils::path_display::{fit_status_line, STATUS_LINE_WIDTH};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Progress {
    value: usize,
    maximum: usize,
    status: String,
}

pub struct PlainReporter {
    destination: PathBuf,
    assume_yes: bool,
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
    progress: Mutex<Progress>,
}

impl PlainReporter {
    pub fn new(destination: PathBuf, assume_yes: bool) -> Self {
        Self::with_io(
            destination,
            assume_yes,
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    pub fn with_io(
        destination: PathBuf,
        assume_yes: bool,
        input: Box<dyn BufRead + Send>,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            destination,
            assume_yes,
            input: Mutex::new(input),
            output: Mutex::new(output),
            progress: Mutex::new(Progress::default()),
        }
    }

    fn write_line(&self, line: &str) {
        let mut output = lock(&self.output);
        if let Err(e) = writeln!(output, "{}", line).and_then(|()| output.flush()) {
            tracing::warn!(error = %e, "failed to write to console");
        }
    }

    fn counter(&self) -> String {
        let progress = lock(&self.progress);
        format_progress(progress.value, progress.maximum)
    }
}

impl ProgressReporter for PlainReporter {
    fn display(&self) -> bool {
        self.write_line("INSTALLER");
        self.write_line(&format!("destination: {}", self.destination.display()));

        if self.assume_yes {
            self.write_line("Begin installation? [y/N] y");
            return true;
        }

        {
            let mut output = lock(&self.output);
            let _ = write!(output, "Begin installation? [y/N] ").and_then(|()| output.flush());
        }

        let mut answer = String::new();
        match lock(&self.input).read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }

    fn log(&self, line: &str) {
        tracing::debug!("{}", line);
        let counter = self.counter();
        self.write_line(&format!("{} {}", counter, line));
    }

    fn set_text(&self, line: &str) {
        let status = fit_status_line(line, STATUS_LINE_WIDTH);
        {
            let mut progress = lock(&self.progress);
            if progress.status == status {
                return;
            }
            progress.status = status.clone();
        }
        self.write_line(&format!("    {}", status));
    }

    fn set_maximum_progress(&self, value: usize) {
        lock(&self.progress).maximum = value;
    }

    fn increment_progress(&self, value: usize) {
        lock(&self.progress).value += value;
    }

    fn set_finishable(&self, enabled: bool) {
        if enabled {
            self.write_line(&format!("{} done", self.counter()));
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    /// 출력 내용을 테스트에서 읽을 수 있는 버퍼
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("lock buffer")).to_string()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn reporter_with(answer: &str, assume_yes: bool) -> (PlainReporter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let reporter = PlainReporter::with_io(
            PathBuf::from("/home/player/Desktop/app"),
            assume_yes,
            Box::new(Cursor::new(answer.as_bytes().to_vec())),
            Box::new(buffer.clone()),
        );
        (reporter, buffer)
    }

    #[test]
    fn test_display_accepts_yes() {
        let (reporter, buffer) = reporter_with("y\n", false);
        assert!(reporter.display());
        assert!(buffer.contents().contains("Begin installation? [y/N]"));

        let (reporter, _) = reporter_with("Yes\n", false);
        assert!(reporter.display());
    }

    #[test]
    fn test_display_declines_by_default() {
        let (reporter, _) = reporter_with("\n", false);
        assert!(!reporter.display());

        let (reporter, _) = reporter_with("", false);
        assert!(!reporter.display());
    }

    #[test]
    fn test_display_assume_yes_skips_input() {
        let (reporter, buffer) = reporter_with("", true);
        assert!(reporter.display());
        assert!(buffer.contents().contains("destination: /home/player/Desktop/app"));
    }

    #[test]
    fn test_log_prints_progress_counter() {
        let (reporter, buffer) = reporter_with("", true);
        reporter.set_maximum_progress(3);
        reporter.increment_progress(1);
        reporter.log("INSTALLING files/a.txt");
        assert!(buffer.contents().contains("[1/3] INSTALLING files/a.txt"));
    }

    #[test]
    fn test_set_text_skips_repeated_status() {
        let (reporter, buffer) = reporter_with("", true);
        reporter.set_text("installing files/big.bin 10%");
        reporter.set_text("installing files/big.bin 10%");
        reporter.set_text("installing files/big.bin 20%");

        let contents = buffer.contents();
        assert_eq!(contents.matches("INSTALLING FILES/BIG.BIN 10%").count(), 1);
        assert!(contents.contains("INSTALLING FILES/BIG.BIN 20%"));
    }
}
