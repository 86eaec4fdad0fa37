use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Cancelled {
    #[error("operation cancelled before {stage}")]
    Requested { stage: String },
    #[error("operation deadline exceeded before {stage}")]
    DeadlineExceeded { stage: String },
}

/// Cancellation and deadline shared by every network call of one update.
///
/// Clones share the cancel flag, so a clone handed to another thread can stop
/// an in-flight download between chunks. Filesystem stages do not consult it.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self, stage: &str) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled::Requested {
                stage: stage.to_string(),
            });
        }
        if self.remaining().is_some_and(|left| left.is_zero()) {
            return Err(Cancelled::DeadlineExceeded {
                stage: stage.to_string(),
            });
        }
        Ok(())
    }
}
