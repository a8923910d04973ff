//! Background worker that drives one turn

use std::fmt;
use std::future::Future;
use std::time::Duration;

use codex_rpc_protocol::JsonRpcNotification;
use codex_rpc_protocol::types::{
    ThreadItem, ThreadTokenUsage, Turn, TurnError, TurnStartParams, TurnStatus, UserInput,
};
use codex_rpc_transport_traits::TransportError;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::event::{TURN_NOTIFICATIONS, TurnEvent, thread_id_of, turn_id_of};
use super::{TurnOptions, TurnResult};
use crate::client::{Client, Subscription};
use crate::error::{Error, Result};
use crate::sync::{GuardedSender, SendFailure};

/// Upper bound on the best-effort `turn/interrupt` sent after cancellation
const INTERRUPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a turn is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnPhase {
    Initializing,
    ThreadStarting,
    TurnStarting,
    Streaming,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::ThreadStarting => "thread_starting",
            Self::TurnStarting => "turn_starting",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// The outcome slot shared between the worker and every result waiter
pub(crate) type Outcome = Option<Result<TurnResult>>;

/// The turn's listener, removed when the turn ends
struct TurnSubscription(Subscription);

impl Drop for TurnSubscription {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

/// Drives a turn from handshake to completion.
///
/// The worker owns the event sender and the outcome slot. On every exit path
/// it stores the outcome first and closes the event channel second, so a
/// reader that sees the channel end always finds the outcome in place.
pub(crate) struct TurnWorker {
    client: Client,
    input: Vec<UserInput>,
    options: TurnOptions,
    cancel: CancellationToken,
    events: Option<GuardedSender<TurnEvent>>,
    outcome: watch::Sender<Outcome>,
    started: Mutex<Option<(String, String)>>,
}

impl TurnWorker {
    pub(crate) fn new(
        client: Client,
        input: Vec<UserInput>,
        options: TurnOptions,
        cancel: CancellationToken,
        events: Option<mpsc::Sender<TurnEvent>>,
        outcome: watch::Sender<Outcome>,
    ) -> Self {
        Self {
            client,
            input,
            options,
            cancel,
            events: events.map(GuardedSender::new),
            outcome,
            started: Mutex::new(None),
        }
    }

    pub(crate) async fn run(self) {
        let began = Instant::now();
        let outcome = match self.options.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.drive())
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Timeout {
                        method: "turn".to_string(),
                        timeout: deadline.saturating_duration_since(began),
                    })
                }),
            None => self.drive().await,
        };

        match &outcome {
            Ok(result) => debug!(
                thread_id = %result.thread_id,
                turn_id = %result.turn_id,
                items = result.items.len(),
                "turn state: completed"
            ),
            Err(Error::Cancelled | Error::Timeout { .. }) => {
                debug!(error = ?outcome.as_ref().err(), "turn state: cancelled");
                self.interrupt();
            }
            Err(e) => debug!(error = %e, "turn state: failed"),
        }

        self.outcome.send_replace(Some(outcome));
        if let Some(events) = &self.events {
            events.close().await;
        }
    }

    async fn drive(&self) -> Result<TurnResult> {
        self.enter(TurnPhase::Initializing);
        self.cancellable(self.client.initialize()).await?;

        let thread_id = match &self.options.thread_id {
            Some(thread_id) => thread_id.clone(),
            None => {
                self.enter(TurnPhase::ThreadStarting);
                let started = self
                    .cancellable(self.client.thread_start(self.options.thread.clone()))
                    .await?;
                started.thread.id
            }
        };

        self.enter(TurnPhase::TurnStarting);
        // Listeners go in before turn/start so no early notification is missed
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(&thread_id, &tx);
        drop(tx);

        let params = TurnStartParams {
            thread_id: thread_id.clone(),
            input: self.input.clone(),
            cwd: self.options.cwd.clone(),
            model: self.options.model.clone(),
            approval_policy: self.options.approval_policy.clone(),
        };
        let response = self.cancellable(self.client.turn_start(params)).await?;
        let turn_id = response.turn.id;
        *self.started.lock() = Some((thread_id.clone(), turn_id.clone()));

        self.enter(TurnPhase::Streaming);
        let result = self.stream(&thread_id, &turn_id, rx).await;
        drop(subscription);
        result
    }

    fn subscribe(
        &self,
        thread_id: &str,
        tx: &mpsc::UnboundedSender<JsonRpcNotification>,
    ) -> TurnSubscription {
        let tx = tx.clone();
        let thread_id = thread_id.to_string();
        let subscription = self.client.on_notifications(
            &TURN_NOTIFICATIONS,
            move |notification: &JsonRpcNotification| {
                if thread_id_of(notification) == Some(thread_id.as_str()) {
                    // A closed receiver means the turn already ended
                    let _ = tx.send(notification.clone());
                }
            },
        );
        TurnSubscription(subscription)
    }

    async fn stream(
        &self,
        thread_id: &str,
        turn_id: &str,
        mut rx: mpsc::UnboundedReceiver<JsonRpcNotification>,
    ) -> Result<TurnResult> {
        let mut items = Vec::new();
        let mut token_usage = None;

        loop {
            let notification = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                received = rx.recv() => match received {
                    Some(notification) => notification,
                    None => return Err(Error::Transport(TransportError::ConnectionClosed)),
                },
                () = self.client.transport_closed() => {
                    return Err(Error::Transport(TransportError::ConnectionClosed));
                }
            };

            if let Some(other) = turn_id_of(&notification)
                && other != turn_id
            {
                trace!(method = %notification.method, turn_id = other, "notification for another turn");
                continue;
            }

            let event = match TurnEvent::from_notification(&notification) {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    warn!(thread_id, turn_id, error = %e, "skipping undecodable turn notification");
                    continue;
                }
                None => continue,
            };

            let completed = match &event {
                TurnEvent::ItemCompleted(completed) => {
                    items.push(completed.item.clone());
                    None
                }
                TurnEvent::TokenUsageUpdated(usage) => {
                    token_usage = Some(usage.token_usage.clone());
                    None
                }
                TurnEvent::ServerError(error) => {
                    debug!(
                        thread_id,
                        turn_id,
                        will_retry = error.will_retry,
                        error = %error.error,
                        "server reported an error"
                    );
                    None
                }
                TurnEvent::TurnCompleted(completed) => Some(completed.turn.clone()),
                _ => None,
            };

            self.emit(event).await?;

            if let Some(turn) = completed {
                return finish(thread_id, turn, items, token_usage);
            }
        }
    }

    /// Deliver an event, waiting for room. A reader that has gone away is not
    /// an error; the turn still runs to its outcome.
    async fn emit(&self, event: TurnEvent) -> Result<()> {
        let Some(events) = &self.events else {
            return Ok(());
        };
        match events.send(event, &self.cancel).await {
            Ok(()) | Err(SendFailure::Closed) => Ok(()),
            Err(SendFailure::Cancelled) => Err(Error::Cancelled),
        }
    }

    async fn cancellable<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        }
    }

    fn enter(&self, phase: TurnPhase) {
        debug!(
            thread_id = ?self.options.thread_id,
            "turn state: {phase}"
        );
    }

    /// Ask the server to stop a turn this worker abandoned.
    fn interrupt(&self) {
        if !self.client.config().interrupt_on_cancel {
            return;
        }
        let Some((thread_id, turn_id)) = self.started.lock().clone() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let interrupt = client.turn_interrupt(&thread_id, &turn_id);
            match tokio::time::timeout(INTERRUPT_TIMEOUT, interrupt).await {
                Ok(Ok(())) => debug!(%thread_id, %turn_id, "turn interrupted"),
                Ok(Err(e)) => debug!(%thread_id, %turn_id, error = %e, "turn/interrupt failed"),
                Err(_) => debug!(%thread_id, %turn_id, "turn/interrupt timed out"),
            }
        });
    }
}

/// Turn a completion into the turn's outcome.
///
/// An embedded error, or a `failed` status without one, fails the turn.
/// `interrupted` without an error is a normal completion.
fn finish(
    thread_id: &str,
    turn: Turn,
    items: Vec<ThreadItem>,
    token_usage: Option<ThreadTokenUsage>,
) -> Result<TurnResult> {
    if let Some(error) = turn.error.clone() {
        return Err(Error::TurnFailed(error));
    }
    if turn.status == TurnStatus::Failed {
        return Err(Error::TurnFailed(TurnError::new(
            "turn failed without an error message",
        )));
    }

    let items = if items.is_empty() {
        turn.items.clone()
    } else {
        items
    };
    let final_response = items
        .iter()
        .rev()
        .find_map(ThreadItem::agent_text)
        .map(str::to_string);

    Ok(TurnResult {
        thread_id: thread_id.to_string(),
        turn_id: turn.id.clone(),
        turn,
        items,
        final_response,
        token_usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_rpc_protocol::types::{AgentMessageItem, ReasoningItem};
    use pretty_assertions::assert_eq;

    fn agent(id: &str, text: &str) -> ThreadItem {
        ThreadItem::AgentMessage(AgentMessageItem {
            id: id.to_string(),
            text: text.to_string(),
        })
    }

    fn turn(status: TurnStatus, error: Option<TurnError>) -> Turn {
        Turn {
            id: "turn_1".to_string(),
            items: Vec::new(),
            status,
            error,
        }
    }

    #[test]
    fn test_final_response_is_last_agent_message() {
        let reasoning: ThreadItem = serde_json::from_value(serde_json::json!({
            "type": "reasoning", "id": "r1", "summary": [], "content": []
        }))
        .unwrap();
        let items = vec![agent("a1", "first"), agent("a2", "second"), reasoning];
        let result = finish("thr", turn(TurnStatus::Completed, None), items, None).unwrap();
        assert_eq!(result.final_response.as_deref(), Some("second"));
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.turn_id, "turn_1");
        assert!(matches!(result.items[2], ThreadItem::Reasoning(ReasoningItem { .. })));
    }

    #[test]
    fn test_embedded_error_fails_the_turn() {
        let error = TurnError::new("context window exceeded");
        let outcome = finish(
            "thr",
            turn(TurnStatus::Failed, Some(error.clone())),
            vec![agent("a1", "partial")],
            None,
        );
        match outcome {
            Err(Error::TurnFailed(e)) => assert_eq!(e, error),
            other => panic!("expected turn failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_status_without_error() {
        let outcome = finish("thr", turn(TurnStatus::Failed, None), Vec::new(), None);
        assert!(matches!(outcome, Err(Error::TurnFailed(_))));
    }

    #[test]
    fn test_interrupted_without_error_completes() {
        let result = finish("thr", turn(TurnStatus::Interrupted, None), Vec::new(), None).unwrap();
        assert_eq!(result.final_response, None);
        assert_eq!(result.turn.status, TurnStatus::Interrupted);
    }

    #[test]
    fn test_turn_items_used_when_nothing_completed() {
        let mut completed = turn(TurnStatus::Completed, None);
        completed.items = vec![agent("a1", "from the turn record")];
        let result = finish("thr", completed, Vec::new(), None).unwrap();
        assert_eq!(result.final_response.as_deref(), Some("from the turn record"));
    }
}
