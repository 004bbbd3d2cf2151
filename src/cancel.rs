//! Cooperative cancellation for long-running history walks.
//!
//! A [`CancelToken`] is checked before every version-control call. Cancelling aborts
//! the current step; work already applied (tags, manifest edits) is not rolled back.

use crate::error::{LibrarianError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .deadline
                .map(|deadline| Instant::now() >= deadline)
                .unwrap_or(false)
    }

    /// Fail with `Cancelled` naming `step` if cancellation was requested
    pub fn check(&self, step: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(LibrarianError::cancelled(format!("aborted before {}", step)));
        }
        Ok(())
    }
}
