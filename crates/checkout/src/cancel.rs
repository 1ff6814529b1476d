//! Cancellation for timers owned by a screen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{CheckoutError, Result};

/// Signals that the screen owning a task has gone away.
///
/// Clones observe the same signal. Once cancelled a token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancels every task observing this token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleeps for `duration` unless cancelled first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        if self.is_cancelled() {
            return Err(CheckoutError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(CheckoutError::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Returns a guard that cancels this token when dropped.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: self.clone(),
        }
    }
}

/// Cancels its token when dropped.
#[derive(Debug)]
pub struct CancelOnDrop {
    token: CancelToken,
}

impl CancelOnDrop {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_secs(3)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let handle = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(CheckoutError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_fails_fast() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.sleep(Duration::from_secs(60)).await.is_err());
    }

    #[test]
    fn test_drop_guard_cancels() {
        let token = CancelToken::new();
        {
            let guard = token.drop_guard();
            assert!(!guard.token().is_cancelled());
        }
        assert!(token.is_cancelled());
    }
}
