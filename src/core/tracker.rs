use crate::core::cancel::CancellationToken;
use crate::utils::error::InstallerError;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// 대기 중 취소 여부를 확인하는 간격
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct TrackerState {
    outstanding: usize,
    failure: Option<InstallerError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Finished,
    Cancelled,
}

/// 남은 추출 작업 수 배리어
///
/// 카운트와 첫 번째 실패는 하나의 락으로만 변경된다.
#[derive(Debug, Default)]
pub struct TaskTracker {
    state: Mutex<TrackerState>,
    all_done: Condvar,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self, count: usize) {
        let mut state = self.lock();
        state.outstanding = count;
        state.failure = None;
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// 작업 하나 종료 (완료/취소/실패 공통). 마지막 작업이면 대기자를 깨운다.
    pub fn complete_one(&self) {
        let mut state = self.lock();
        if state.outstanding == 0 {
            return;
        }
        state.outstanding -= 1;
        if state.outstanding == 0 {
            self.all_done.notify_all();
        }
    }

    /// 첫 번째 실패만 보관
    pub fn record_failure(&self, error: InstallerError) {
        let mut state = self.lock();
        if state.failure.is_none() {
            state.failure = Some(error);
        }
    }

    pub fn take_failure(&self) -> Option<InstallerError> {
        self.lock().failure.take()
    }

    /// 모든 작업이 끝나거나 취소될 때까지 대기
    pub fn wait(&self, cancel: &CancellationToken) -> WaitOutcome {
        let mut state = self.lock();
        loop {
            if state.outstanding == 0 {
                return WaitOutcome::Finished;
            }
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            state = self
                .all_done
                .wait_timeout(state, WAIT_POLL_INTERVAL)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// 제한 시간 안에 모든 작업이 끝나면 `true`
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.outstanding > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .all_done
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        true
    }

    pub fn guard(self: &Arc<Self>, entry_name: &str) -> CompletionGuard {
        CompletionGuard {
            tracker: Arc::clone(self),
            entry_name: entry_name.to_string(),
        }
    }
}

/// 작업 스레드가 어떤 경로로 끝나든 카운트를 정확히 한 번 줄인다.
pub struct CompletionGuard {
    tracker: Arc<TaskTracker>,
    entry_name: String,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.tracker.record_failure(InstallerError::ExtractFailed {
                entry: std::mem::take(&mut self.entry_name),
                source: std::io::Error::other("extraction thread panicked"),
            });
        }
        self.tracker.complete_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_with_no_tasks_returns_immediately() {
        let tracker = TaskTracker::new();
        tracker.start(0);
        assert_eq!(
            tracker.wait(&CancellationToken::new()),
            WaitOutcome::Finished
        );
    }

    #[test]
    fn test_wait_until_last_completion() {
        let tracker = Arc::new(TaskTracker::new());
        tracker.start(4);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(5 * i));
                    tracker.complete_one();
                })
            })
            .collect();

        assert_eq!(
            tracker.wait(&CancellationToken::new()),
            WaitOutcome::Finished
        );
        assert_eq!(tracker.outstanding(), 0);
        for handle in handles {
            handle.join().expect("join worker");
        }
    }

    #[test]
    fn test_wait_observes_cancellation() {
        let tracker = TaskTracker::new();
        tracker.start(1);
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(tracker.wait(&token), WaitOutcome::Cancelled);
    }

    #[test]
    fn test_wait_timeout_expires() {
        let tracker = TaskTracker::new();
        tracker.start(1);
        assert!(!tracker.wait_timeout(Duration::from_millis(20)));
        tracker.complete_one();
        assert!(tracker.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_first_failure_wins() {
        let tracker = TaskTracker::new();
        tracker.record_failure(InstallerError::Config("first".to_string()));
        tracker.record_failure(InstallerError::Config("second".to_string()));
        match tracker.take_failure() {
            Some(InstallerError::Config(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(tracker.take_failure().is_none());
    }

    #[test]
    fn test_guard_completes_on_panic() {
        let tracker = Arc::new(TaskTracker::new());
        tracker.start(1);

        let worker_tracker = Arc::clone(&tracker);
        let result = thread::spawn(move || {
            let _guard = worker_tracker.guard("files/a.txt");
            panic!("boom");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(tracker.outstanding(), 0);
        assert!(matches!(
            tracker.take_failure(),
            Some(InstallerError::ExtractFailed { .. })
        ));
    }
}
