//! Cooperative per-request cancellation.
//!
//! A host creates one [`AbortHandle`]/[`AbortSignal`] pair per request. The
//! signal travels inside the request's [`InvocationContext`](crate::InvocationContext)
//! and binding races against it, so an aborted request stops binding promptly
//! and never reaches its handler.
//!
//! # Example
//!
//! ```rust
//! use bindery_core::AbortSignal;
//!
//! let (handle, signal) = AbortSignal::pair();
//! assert!(!signal.is_aborted());
//!
//! handle.abort();
//! assert!(signal.is_aborted());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Triggering side of a request abort.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    /// Aborts the request. Calling this more than once has no further effect.
    pub fn abort(&self) {
        self.sender.send_replace(true);
    }
}

/// Observing side of a request abort.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    receiver: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// Creates a connected handle and signal.
    #[must_use]
    pub fn pair() -> (AbortHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (
            AbortHandle {
                sender: Arc::new(sender),
            },
            Self {
                receiver: Some(receiver),
            },
        )
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self { receiver: None }
    }

    /// Returns `true` once the request has been aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Completes when the request is aborted.
    ///
    /// Never completes for [`AbortSignal::never`], or when every handle was
    /// dropped without aborting.
    pub async fn aborted(&self) {
        let Some(receiver) = &self.receiver else {
            return std::future::pending().await;
        };

        let mut receiver = receiver.clone();
        let closed = receiver.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_aborted_completes_after_abort() {
        let (handle, signal) = AbortSignal::pair();

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.aborted().await }
        });

        handle.abort();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("abort should wake waiters")
            .unwrap();
    }

    #[tokio::test]
    async fn test_never_does_not_complete() {
        let signal = AbortSignal::never();
        let result = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(result.is_err());
        assert!(!signal.is_aborted());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_abort() {
        let (handle, signal) = AbortSignal::pair();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(result.is_err());
    }
}
