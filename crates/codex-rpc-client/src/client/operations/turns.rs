//! Turn operations
//!
//! [`Client::turn_start`] and [`Client::turn_interrupt`] are single requests.
//! [`Client::stream_turn`] and [`Client::run_turn`] run a whole turn: the
//! handshake, a new thread unless one is given, the turn itself, and every
//! notification up to its completion.

use codex_rpc_protocol::methods::client_request;
use codex_rpc_protocol::types::{
    TurnInterruptParams, TurnInterruptResponse, TurnStartParams, TurnStartResponse, UserInput,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::client::core::Client;
use crate::error::Result;
use crate::turn::{TurnEvent, TurnOptions, TurnResult, TurnStream, TurnWorker};

impl Client {
    /// Start a turn on a thread. Its progress arrives as notifications.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn turn_start(&self, params: TurnStartParams) -> Result<TurnStartResponse> {
        self.ensure_initialized()?;
        let response: TurnStartResponse = self
            .send_request(client_request::TURN_START, &params)
            .await?;
        debug!(thread_id = %params.thread_id, turn_id = %response.turn.id, "turn started");
        Ok(response)
    }

    /// Ask the server to stop a running turn.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn turn_interrupt(&self, thread_id: &str, turn_id: &str) -> Result<()> {
        self.ensure_initialized()?;
        let params = TurnInterruptParams {
            thread_id: thread_id.to_string(),
            turn_id: turn_id.to_string(),
        };
        let _: TurnInterruptResponse = self
            .send_request(client_request::TURN_INTERRUPT, &params)
            .await?;
        Ok(())
    }

    /// Run a turn in the background and stream its events.
    ///
    /// Returns immediately; the handshake and thread creation happen on the
    /// worker. Must be called from within a Tokio runtime.
    ///
    /// ```rust,no_run
    /// # use codex_rpc_client::{Client, TurnEvent, TurnOptions};
    /// # use codex_rpc_client::types::UserInput;
    /// # async fn example(client: Client) -> codex_rpc_client::Result<()> {
    /// use futures::StreamExt;
    ///
    /// let input = vec![UserInput::text("run the tests")];
    /// let mut turn = client.stream_turn(input, TurnOptions::new());
    /// let mut events = turn.events();
    /// while let Some(event) = events.next().await {
    ///     if let TurnEvent::AgentMessageDelta(delta) = event? {
    ///         print!("{}", delta.delta);
    ///     }
    /// }
    /// let result = turn.result().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn stream_turn(&self, input: Vec<UserInput>, options: TurnOptions) -> TurnStream {
        let (events_tx, events_rx) = mpsc::channel(self.inner.config.event_buffer.max(1));
        self.spawn_turn(input, options, Some(events_tx), Some(events_rx))
    }

    /// Run a turn to completion and return its result.
    ///
    /// # Errors
    ///
    /// [`Error::TurnFailed`](crate::Error::TurnFailed) if the turn ended with
    /// an error, [`Error::Cancelled`](crate::Error::Cancelled) or
    /// [`Error::Timeout`](crate::Error::Timeout) if it was stopped, or the
    /// error of whichever request failed on the way.
    pub async fn run_turn(
        &self,
        input: Vec<UserInput>,
        options: TurnOptions,
    ) -> Result<TurnResult> {
        self.spawn_turn(input, options, None, None).into_result().await
    }

    fn spawn_turn(
        &self,
        input: Vec<UserInput>,
        options: TurnOptions,
        events_tx: Option<mpsc::Sender<TurnEvent>>,
        events_rx: Option<mpsc::Receiver<TurnEvent>>,
    ) -> TurnStream {
        let cancel = options
            .cancel
            .as_ref()
            .map(|token| token.child_token())
            .unwrap_or_default();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        let worker = TurnWorker::new(
            self.clone(),
            input,
            options,
            cancel.clone(),
            events_tx,
            outcome_tx,
        );
        tokio::spawn(worker.run());
        TurnStream::new(events_rx, outcome_rx, cancel)
    }
}
