//! 설치 엔진이 표시 계층으로 보내는 진행 상황 인터페이스
//!
//! 엔진은 여러 작업 스레드에서 동시에 호출하므로 구현체는 `Send + Sync`여야 한다.

pub trait ProgressReporter: Send + Sync {
    /// 설치 시작 확인. `false`면 아무것도 기록하지 않고 중단
    fn display(&self) -> bool;

    /// 정보 로그 한 줄 (프로세스 로그에도 남긴다)
    fn log(&self, line: &str);

    /// 자주 바뀌는 상태 문구 (퍼센트 등)
    fn set_text(&self, line: &str);

    fn set_maximum_progress(&self, value: usize);

    fn increment_progress(&self, value: usize);

    /// 완료 버튼 활성화
    fn set_finishable(&self, enabled: bool);
}
