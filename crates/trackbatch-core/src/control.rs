//! Run-wide cancellation.
//!
//! A [`RunControl`] is cloned into every batch task. Once `cancel` is called,
//! pending backoff sleeps end immediately and in-flight curl transfers abort
//! from their progress callback.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared cancellation signal for one run.
#[derive(Debug, Clone)]
pub struct RunControl {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation of the whole run. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Non-blocking check; safe to call from curl callbacks on blocking threads.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // Sender is owned by `self`, so this only happens during teardown.
            std::future::pending::<()>().await;
        }
    }
}
