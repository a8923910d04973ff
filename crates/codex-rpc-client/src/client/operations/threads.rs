//! Thread operations

use codex_rpc_protocol::methods::client_request;
use codex_rpc_protocol::types::{
    ThreadResumeParams, ThreadResumeResponse, ThreadStartParams, ThreadStartResponse,
};
use tracing::debug;

use crate::client::core::Client;
use crate::error::Result;

impl Client {
    /// Start a new thread.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn thread_start(&self, params: ThreadStartParams) -> Result<ThreadStartResponse> {
        self.ensure_initialized()?;
        let response: ThreadStartResponse = self
            .send_request(client_request::THREAD_START, &params)
            .await?;
        debug!(thread_id = %response.thread.id, model = ?response.model, "thread started");
        Ok(response)
    }

    /// Load a stored thread so new turns can run on it.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn thread_resume(&self, params: ThreadResumeParams) -> Result<ThreadResumeResponse> {
        self.ensure_initialized()?;
        let response: ThreadResumeResponse = self
            .send_request(client_request::THREAD_RESUME, &params)
            .await?;
        debug!(thread_id = %response.thread.id, "thread resumed");
        Ok(response)
    }
}
