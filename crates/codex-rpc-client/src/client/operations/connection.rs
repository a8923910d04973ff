//! The `initialize` handshake

use codex_rpc_protocol::methods::{client_notification, client_request};
use codex_rpc_protocol::types::{InitializeParams, InitializeResponse};
use tracing::{debug, info};

use crate::client::core::Client;
use crate::error::{Error, Result};

impl Client {
    /// Perform the handshake, once per connection.
    ///
    /// Sends `initialize` followed by the `initialized` notification. Every
    /// clone of the client shares the one attempt: concurrent callers wait for
    /// it, and later callers get its stored outcome, including a failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handshake`] if the request or the notification failed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use codex_rpc_client::ClientBuilder;
    /// # use codex_rpc_stdio::StdioTransport;
    /// # async fn example() -> codex_rpc_client::Result<()> {
    /// let client = ClientBuilder::new().build(StdioTransport::new()).await?;
    /// let info = client.initialize().await?;
    /// println!("connected to {}", info.user_agent);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn initialize(&self) -> Result<InitializeResponse> {
        self.inner
            .handshake
            .get_or_init(|| self.handshake())
            .await
            .clone()
    }

    /// `true` once the handshake has succeeded
    pub fn is_initialized(&self) -> bool {
        matches!(self.inner.handshake.get(), Some(Ok(_)))
    }

    async fn handshake(&self) -> Result<InitializeResponse> {
        let params = InitializeParams {
            client_info: self.inner.config.client_info.clone(),
        };
        debug!(client = %params.client_info.name, "sending initialize");

        let response: InitializeResponse = self
            .send_request(client_request::INITIALIZE, &params)
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;
        self.notify(client_notification::INITIALIZED, &())
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;

        info!(user_agent = %response.user_agent, "initialized");
        Ok(response)
    }

    /// Fail unless the handshake has succeeded.
    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        match self.inner.handshake.get() {
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(Error::Handshake(
                "client not initialized; call initialize() first".to_string(),
            )),
        }
    }
}
