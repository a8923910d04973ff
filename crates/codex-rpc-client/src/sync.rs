//! A bounded sender whose close cannot race an in-flight send.

use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

/// Why [`GuardedSender::send`] did not deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendFailure {
    /// The sender was closed, or the receiver is gone
    Closed,
    /// The cancellation token fired while waiting for space
    Cancelled,
}

/// Wraps an `mpsc::Sender` so that closing waits for any send in progress.
///
/// Sends share a read lock; [`close`](Self::close) takes the write lock and
/// drops the sender, after which every send reports [`SendFailure::Closed`].
#[derive(Debug)]
pub(crate) struct GuardedSender<T> {
    sender: RwLock<Option<mpsc::Sender<T>>>,
}

impl<T> GuardedSender<T> {
    pub(crate) fn new(sender: mpsc::Sender<T>) -> Self {
        Self {
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Deliver `value`, waiting for buffer space unless `cancel` fires first.
    pub(crate) async fn send(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> Result<(), SendFailure> {
        let guard = self.sender.read().await;
        let Some(sender) = guard.as_ref() else {
            return Err(SendFailure::Closed);
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SendFailure::Cancelled),
            sent = sender.send(value) => sent.map_err(|_| SendFailure::Closed),
        }
    }

    /// Drop the sender. Returns `false` if it was already closed.
    pub(crate) async fn close(&self) -> bool {
        self.sender.write().await.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_then_close() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = GuardedSender::new(tx);
        let cancel = CancellationToken::new();

        assert_eq!(sender.send(1, &cancel).await, Ok(()));
        assert!(sender.close().await);
        assert!(!sender.close().await);
        assert_eq!(sender.send(2, &cancel).await, Err(SendFailure::Closed));

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_buffer_send_honours_cancellation() {
        let (tx, _rx) = mpsc::channel(1);
        let sender = GuardedSender::new(tx);
        let cancel = CancellationToken::new();
        sender.send(1, &cancel).await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        assert_eq!(sender.send(2, &cancel).await, Err(SendFailure::Cancelled));
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_send() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = Arc::new(GuardedSender::new(tx));
        let cancel = CancellationToken::new();
        sender.send(1, &cancel).await.unwrap();

        // Blocks until the receiver makes room
        let blocked = {
            let sender = Arc::clone(&sender);
            let cancel = cancel.clone();
            tokio::spawn(async move { sender.send(2, &cancel).await })
        };
        tokio::task::yield_now().await;

        let closer = {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move { sender.close().await })
        };
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(blocked.await.unwrap(), Ok(()));
        assert!(closer.await.unwrap());
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = GuardedSender::new(tx);
        assert_eq!(
            sender.send(1, &CancellationToken::new()).await,
            Err(SendFailure::Closed)
        );
    }
}
