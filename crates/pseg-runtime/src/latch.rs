//! Single-assignment awaitable status flag.

use std::sync::Arc;
use tokio::sync::watch;

/// One-shot boolean used to publish the outcome of a startup phase.
///
/// Starts unresolved. [`resolve`](Self::resolve) assigns the outcome exactly
/// once and wakes every waiter, current and future; later calls are ignored.
/// Clones share the same flag.
#[derive(Clone)]
pub struct StatusLatch {
    tx: Arc<watch::Sender<Option<bool>>>,
}

impl StatusLatch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Assign the outcome. First write wins.
    pub fn resolve(&self, outcome: bool) {
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(outcome);
                true
            } else {
                false
            }
        });
    }

    /// Wait until the latch resolves and return the outcome. Returns
    /// immediately if already resolved.
    pub async fn wait(&self) -> bool {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(outcome) = *rx.borrow_and_update() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as any clone of the latch, so a
                // closed channel means teardown; report the phase as failed.
                return false;
            }
        }
    }

    /// Outcome if resolved, `None` otherwise.
    pub fn status(&self) -> Option<bool> {
        *self.tx.borrow()
    }
}

impl Default for StatusLatch {
    fn default() -> Self {
        Self::new()
    }
}
