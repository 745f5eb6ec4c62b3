use crate::core::cancel::CancellationToken;
use crate::models::operation::InstallPhase;
use crate::system::archive::InstallArchive;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 설치 엔진 내부 상태
///
/// 엔진과 롤백 컨트롤러만 접근하며 항상 하나의 락 아래에서 변경된다.
/// 작업 스레드는 이 상태를 보지 않는다.
#[derive(Debug, Default)]
pub struct EngineState {
    pub phase: InstallPhase,
    pub archive: Option<InstallArchive>,
    pub extraction_root: Option<PathBuf>,
    /// 승격 전까지 기록되는 모든 파일의 상위 디렉토리
    pub staging_dir: Option<PathBuf>,
    pub temp_archive: Option<PathBuf>,
    /// 설치가 새로 만든 추출 위치 디렉토리 (깊은 것부터)
    pub created_dirs: Vec<PathBuf>,
    pub run_token: Option<CancellationToken>,
}

pub fn lock_state(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
