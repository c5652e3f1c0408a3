use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot stop flag shared by a producer and its stream.
///
/// Raising is a compare-and-set, so it is safe to raise any number of times;
/// only the first raise reports `true`. Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn raise(&self) -> bool {
        self.raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
