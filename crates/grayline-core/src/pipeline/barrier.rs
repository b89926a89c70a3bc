//! Completion barrier the driver waits on until every stage has drained.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counts live stages; `wait` resolves once the count drops to zero.
///
/// Each stage is handed a `StageToken` when it is started and releases it
/// exactly once when it exits. Tokens release on drop, so a stage that
/// panics still lets the driver proceed.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more stage and return its token.
    pub fn enter(&self) -> StageToken {
        self.inner.remaining.fetch_add(1, Ordering::AcqRel);
        StageToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Stages that have not yet released their token.
    pub fn pending(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Wait until every registered stage has released its token.
    pub async fn wait(&self) {
        loop {
            // Created before the check so a release in between is not missed.
            let notified = self.inner.notify.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Proof that a stage is still running. Dropping it marks the stage done.
#[derive(Debug)]
pub struct StageToken {
    inner: Arc<Inner>,
}

impl StageToken {
    /// Mark the stage as fully exited.
    pub fn release(self) {}
}

impl Drop for StageToken {
    fn drop(&mut self) {
        if self.inner.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}
