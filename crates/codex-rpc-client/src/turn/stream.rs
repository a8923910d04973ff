//! Application-facing handles for a running turn

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::TurnResult;
use super::event::TurnEvent;
use super::worker::Outcome;
use crate::error::{Error, Result};

/// A running turn.
///
/// Dropping the handle cancels the turn if it has not finished yet.
#[derive(Debug)]
pub struct TurnStream {
    events: Option<mpsc::Receiver<TurnEvent>>,
    outcome: watch::Receiver<Outcome>,
    cancel: CancellationToken,
}

impl TurnStream {
    pub(crate) fn new(
        events: Option<mpsc::Receiver<TurnEvent>>,
        outcome: watch::Receiver<Outcome>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            events,
            outcome,
            cancel,
        }
    }

    /// Take the event sequence.
    ///
    /// Events arrive in the order the server sent them, ending with
    /// [`TurnEvent::TurnCompleted`] when the turn completes. If the turn
    /// fails or is cancelled, the sequence then yields exactly one `Err`.
    /// Only the first call gets the events; later calls get a sequence that
    /// yields [`Error::StreamConsumed`].
    ///
    /// Until the events are taken they wait in a bounded buffer, and the
    /// turn stalls once it is full. Use [`into_result`](Self::into_result)
    /// to discard them.
    pub fn events(&mut self) -> TurnEvents {
        match self.events.take() {
            Some(receiver) => TurnEvents {
                state: EventsState::Live {
                    receiver,
                    outcome: self.outcome.clone(),
                },
            },
            None => TurnEvents {
                state: EventsState::Consumed,
            },
        }
    }

    /// Wait for the turn's outcome.
    ///
    /// Independent of the event sequence: it may be awaited before, during,
    /// or after reading events, from any number of places.
    ///
    /// # Errors
    ///
    /// [`Error::TurnFailed`] for a turn-level error, [`Error::Cancelled`] or
    /// [`Error::Timeout`] if the turn was stopped, or the error of the request
    /// that failed on the way.
    pub async fn result(&self) -> Result<TurnResult> {
        wait_for_outcome(self.outcome.clone()).await
    }

    /// Discard the events and wait for the outcome.
    ///
    /// # Errors
    ///
    /// As for [`result`](Self::result).
    pub async fn into_result(mut self) -> Result<TurnResult> {
        self.events = None;
        self.result().await
    }

    /// Stop the turn. The outcome becomes [`Error::Cancelled`] unless it
    /// already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` once the outcome is known
    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }
}

impl Drop for TurnStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn wait_for_outcome(mut outcome: watch::Receiver<Outcome>) -> Result<TurnResult> {
    if let Ok(ready) = outcome.wait_for(Option::is_some).await
        && let Some(result) = ready.as_ref()
    {
        return result.clone();
    }
    // The worker went away without an outcome
    Err(Error::Cancelled)
}

/// The events of one turn, as a [`Stream`] of `Result<TurnEvent>`.
#[derive(Debug)]
pub struct TurnEvents {
    state: EventsState,
}

#[derive(Debug)]
enum EventsState {
    Live {
        receiver: mpsc::Receiver<TurnEvent>,
        outcome: watch::Receiver<Outcome>,
    },
    Consumed,
    Done,
}

impl TurnEvents {
    /// Next event, or `None` once the sequence has ended
    pub async fn next_event(&mut self) -> Option<Result<TurnEvent>> {
        futures::StreamExt::next(self).await
    }
}

impl Stream for TurnEvents {
    type Item = Result<TurnEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let terminal = match &mut self.state {
            EventsState::Live { receiver, outcome } => match receiver.poll_recv(cx) {
                Poll::Ready(Some(event)) => return Poll::Ready(Some(Ok(event))),
                Poll::Pending => return Poll::Pending,
                // The worker stores the outcome before it closes the channel
                Poll::Ready(None) => match &*outcome.borrow() {
                    Some(Ok(_)) => None,
                    Some(Err(e)) => Some(e.clone()),
                    None => Some(Error::Cancelled),
                },
            },
            EventsState::Consumed => Some(Error::StreamConsumed),
            EventsState::Done => return Poll::Ready(None),
        };
        self.state = EventsState::Done;
        Poll::Ready(terminal.map(Err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_rpc_protocol::types::{TurnError, TurnStartedNotification};
    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready};

    fn started() -> TurnEvent {
        TurnEvent::TurnStarted(
            serde_json::from_value::<TurnStartedNotification>(serde_json::json!({
                "threadId": "t", "turn": {"id": "u", "status": "inProgress"}
            }))
            .unwrap(),
        )
    }

    fn handle() -> (TurnStream, mpsc::Sender<TurnEvent>, watch::Sender<Outcome>) {
        let (events_tx, events_rx) = mpsc::channel(4);
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let stream = TurnStream::new(Some(events_rx), outcome_rx, CancellationToken::new());
        (stream, events_tx, outcome_tx)
    }

    #[tokio::test]
    async fn test_error_follows_the_last_event() {
        let (mut stream, events_tx, outcome_tx) = handle();
        events_tx.send(started()).await.unwrap();
        outcome_tx.send_replace(Some(Err(Error::TurnFailed(TurnError::new("boom")))));
        drop(events_tx);

        let mut events = stream.events();
        assert!(matches!(events.next().await, Some(Ok(TurnEvent::TurnStarted(_)))));
        assert!(matches!(events.next().await, Some(Err(Error::TurnFailed(_)))));
        assert!(events.next().await.is_none());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_second_take_is_consumed() {
        let (mut stream, _events_tx, _outcome_tx) = handle();
        let _first = stream.events();
        let mut second = stream.events();
        assert!(matches!(second.next().await, Some(Err(Error::StreamConsumed))));
        assert!(second.next().await.is_none());
    }

    #[tokio::test]
    async fn test_result_does_not_need_drained_events() {
        let (stream, events_tx, outcome_tx) = handle();
        events_tx.send(started()).await.unwrap();

        let mut waiting = tokio_test::task::spawn(stream.result());
        assert_pending!(waiting.poll());

        outcome_tx.send_replace(Some(Err(Error::Cancelled)));
        assert!(waiting.is_woken());
        let outcome = assert_ready!(waiting.poll());
        assert!(matches!(outcome, Err(Error::Cancelled)));
        assert!(stream.is_finished());
    }

    #[tokio::test]
    async fn test_vanished_worker_reads_as_cancelled() {
        let (stream, events_tx, outcome_tx) = handle();
        drop(events_tx);
        drop(outcome_tx);
        assert!(matches!(stream.result().await, Err(Error::Cancelled)));
    }

    #[test]
    fn test_drop_cancels() {
        let (events_tx, events_rx) = mpsc::channel::<TurnEvent>(1);
        let (_outcome_tx, outcome_rx) = watch::channel(None);
        let token = CancellationToken::new();
        let stream = TurnStream::new(Some(events_rx), outcome_rx, token.clone());
        drop(stream);
        assert!(token.is_cancelled());
        drop(events_tx);
    }
}
