//! Cancellation signal for long-running waits.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable, one-way cancellation flag.
///
/// Every clone observes the same flag. Once cancelled it stays cancelled, and
/// `cancelled()` resolves immediately for waiters that start afterwards.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger cancellation for every holder of this signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so `wait_for` can only return once the
        // flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn clones_share_the_flag() {
        let signal = CancelSignal::new();
        let other = signal.clone();
        assert!(!other.is_cancelled());

        signal.cancel();
        assert!(other.is_cancelled());
        other.cancelled().await;
    }

    #[tokio::test]
    async fn late_waiters_resolve_immediately() {
        let signal = CancelSignal::new();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(50), signal.clone().cancelled())
            .await
            .expect("already cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn wakes_pending_waiters() {
        let signal = CancelSignal::new();
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.cancelled().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        signal.cancel();
        waiter.await.unwrap();
    }
}
