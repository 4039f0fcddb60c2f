use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory cancellation flag shared between the submitter and a running job.
///
/// Setting the flag does not interrupt anything. The job polls it at its
/// cooperative check points (before opening a connection, between HTTP
/// chunks, and on every extractor progress callback) and stops at the next
/// one it reaches. A blocked network read is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
