//! Streamed turn execution
//!
//! A turn moves through
//! `Initializing -> ThreadStarting -> TurnStarting -> Streaming` and ends
//! exactly once in `Completed`, `Failed`, or `Cancelled`. A background worker
//! drives it; the application sees it as a [`TurnStream`]:
//!
//! - [`TurnStream::events`] yields typed [`TurnEvent`]s in arrival order,
//!   then at most one terminal error
//! - [`TurnStream::result`] waits for the outcome, whether or not the events
//!   are being read
//!
//! Notifications for other threads or turns are ignored, so any number of
//! turns can share one client.

mod event;
mod stream;
mod worker;

use std::path::PathBuf;
use std::time::Duration;

use codex_rpc_protocol::types::{ThreadItem, ThreadStartParams, ThreadTokenUsage, Turn};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub use event::TurnEvent;
pub use stream::{TurnEvents, TurnStream};

pub(crate) use worker::TurnWorker;

/// How a turn runs
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Continue this thread instead of starting a new one
    pub thread_id: Option<String>,
    /// Params for `thread/start` when a new thread is started
    pub thread: ThreadStartParams,
    /// Model override for this turn
    pub model: Option<String>,
    /// Working directory override for this turn
    pub cwd: Option<PathBuf>,
    /// Approval policy override, passed through as given
    pub approval_policy: Option<Value>,
    /// Cancels the turn when fired
    pub cancel: Option<CancellationToken>,
    /// The turn fails with a timeout if it has not finished by then
    pub deadline: Option<Instant>,
}

impl TurnOptions {
    /// Start a new thread with default params
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the turn on an existing thread
    #[must_use]
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Params for the new thread
    #[must_use]
    pub fn thread_params(mut self, params: ThreadStartParams) -> Self {
        self.thread = params;
        self
    }

    /// Model for this turn
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Working directory for this turn
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Approval policy for this turn
    #[must_use]
    pub fn approval_policy(mut self, policy: Value) -> Self {
        self.approval_policy = Some(policy);
        self
    }

    /// Cancel the turn when `token` fires
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fail the turn if it has not finished by `deadline`
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail the turn if it has not finished within `timeout` from now
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }
}

/// What a completed turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// Thread the turn ran on
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// The turn as the server reported it on completion
    pub turn: Turn,
    /// Completed items, in completion order
    pub items: Vec<ThreadItem>,
    /// Text of the last agent message
    pub final_response: Option<String>,
    /// Last token usage the server reported
    pub token_usage: Option<ThreadTokenUsage>,
}
