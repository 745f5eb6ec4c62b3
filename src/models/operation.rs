//! 설치 작업 모델
//!
//! 엔진 상태 머신 단계와 개별 추출 작업 결과 정의

/// 설치 엔진 단계
///
/// `Idle → Planning → Running → Promoting → Done`
/// 실패/취소 시 `Cancelling → Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallPhase {
    #[default]
    Idle,
    Planning,
    Running,
    Promoting,
    Done,
    Cancelling,
    Aborted,
}

impl InstallPhase {
    pub fn name(&self) -> &'static str {
        match self {
            InstallPhase::Idle => "idle",
            InstallPhase::Planning => "planning",
            InstallPhase::Running => "running",
            InstallPhase::Promoting => "promoting",
            InstallPhase::Done => "done",
            InstallPhase::Cancelling => "cancelling",
            InstallPhase::Aborted => "aborted",
        }
    }

    /// 롤백 대상이 되는 단계인지 확인
    pub fn can_abort(&self) -> bool {
        matches!(
            self,
            InstallPhase::Planning | InstallPhase::Running | InstallPhase::Promoting
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallPhase::Done | InstallPhase::Aborted)
    }
}

/// 추출 작업 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// 파일 기록 완료
    Completed,
    /// 취소 신호로 중단
    Cancelled,
    /// I/O 오류 (트래커에 기록됨)
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_abort_window() {
        assert!(!InstallPhase::Idle.can_abort());
        assert!(InstallPhase::Planning.can_abort());
        assert!(InstallPhase::Running.can_abort());
        assert!(InstallPhase::Promoting.can_abort());
        assert!(!InstallPhase::Done.can_abort());
        assert!(!InstallPhase::Aborted.can_abort());
    }

    #[test]
    fn test_terminal_phases() {
        assert!(InstallPhase::Done.is_terminal());
        assert!(InstallPhase::Aborted.is_terminal());
        assert!(!InstallPhase::Cancelling.is_terminal());
        assert_eq!(InstallPhase::default(), InstallPhase::Idle);
    }
}
