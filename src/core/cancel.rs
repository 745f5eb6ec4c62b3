use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 협력적 취소 신호
///
/// 복제본은 같은 플래그를 공유한다. `child_token`으로 만든 토큰은
/// 부모가 취소되어도 취소된 것으로 보지만, 자식 취소는 부모에 전파되지 않는다.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.load(Ordering::SeqCst))
    }

    pub fn child_token(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::clone(&self.flag)),
        }
    }
}
