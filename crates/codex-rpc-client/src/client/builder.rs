//! Client builder
//!
//! Provides a fluent interface for configuring a client before it connects.

use std::sync::Arc;
use std::time::Duration;

use codex_rpc_protocol::types::ClientInfo;
use codex_rpc_transport_traits::{TimeoutConfig, Transport};

use super::config::ClientConfig;
use super::core::Client;
use crate::error::{Error, Result};
use crate::handlers::ApprovalHandlers;

/// Builder for configuring and connecting a [`Client`]
///
/// # Examples
///
/// ```rust,no_run
/// use codex_rpc_client::ClientBuilder;
/// use codex_rpc_client::handlers::{ApprovalHandlers, DeclineAll};
/// use codex_rpc_stdio::StdioTransport;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> codex_rpc_client::Result<()> {
/// let client = ClientBuilder::new()
///     .request_timeout(Duration::from_secs(120))
///     .approval_handlers(ApprovalHandlers::all(Arc::new(DeclineAll)))
///     .event_buffer(256)
///     .build(StdioTransport::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    timeouts: TimeoutConfig,
    approvals: ApprovalHandlers,
}

impl ClientBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline for each request
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self.timeouts.request = Some(timeout);
        self
    }

    /// Let requests wait for their response indefinitely
    pub fn no_request_timeout(mut self) -> Self {
        self.config.request_timeout = None;
        self.timeouts.request = None;
        self
    }

    /// Request and write timeouts together.
    ///
    /// The write timeout reaches the transport only when the builder creates
    /// it, as [`spawn`](Self::spawn) does.
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.config.request_timeout = timeouts.request;
        self.timeouts = timeouts;
        self
    }

    /// Identity sent in the `initialize` handshake
    pub fn client_info(mut self, client_info: ClientInfo) -> Self {
        self.config.client_info = client_info;
        self
    }

    /// Approval handlers to answer server requests with
    pub fn approval_handlers(mut self, handlers: ApprovalHandlers) -> Self {
        self.approvals = handlers;
        self
    }

    /// Capacity of each turn's event channel (default 64)
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.config.event_buffer = capacity;
        self
    }

    /// Whether cancelling a running turn sends `turn/interrupt` (default `true`)
    pub fn interrupt_on_cancel(mut self, enabled: bool) -> Self {
        self.config.interrupt_on_cancel = enabled;
        self
    }

    /// The configuration the client will run with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect a client over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unusable setting, or
    /// [`Error::Transport`] if the transport fails to connect.
    pub async fn build<T>(self, transport: T) -> Result<Client>
    where
        T: Transport + 'static,
    {
        self.build_shared(Arc::new(transport)).await
    }

    /// Connect a client over a transport that is already shared.
    ///
    /// # Errors
    ///
    /// As for [`build`](Self::build).
    pub async fn build_shared(self, transport: Arc<dyn Transport>) -> Result<Client> {
        if self.config.event_buffer == 0 {
            return Err(Error::Configuration(
                "event buffer capacity must be at least 1".to_string(),
            ));
        }
        if self.config.request_timeout == Some(Duration::ZERO) {
            return Err(Error::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Client::connect_with(transport, self.config, self.approvals).await
    }

    /// Spawn an agent server and connect to it over its stdio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the process cannot be started, and
    /// otherwise as for [`build`](Self::build).
    #[cfg(feature = "stdio")]
    pub async fn spawn(self, command: tokio::process::Command) -> Result<Client> {
        use codex_rpc_stdio::{StdioTransport, TransportConfig};

        let transport = StdioTransport::spawn(command)?.with_config(TransportConfig {
            timeouts: self.timeouts.clone(),
            ..TransportConfig::default()
        });
        self.build(transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_settings() {
        let builder = ClientBuilder::new()
            .request_timeout(Duration::from_secs(5))
            .event_buffer(8)
            .interrupt_on_cancel(false);
        assert_eq!(builder.config().request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.config().event_buffer, 8);
        assert!(!builder.config().interrupt_on_cancel);

        let builder = builder.no_request_timeout();
        assert_eq!(builder.config().request_timeout, None);

        let builder = builder.timeouts(TimeoutConfig::fast());
        assert_eq!(
            builder.config().request_timeout,
            TimeoutConfig::fast().request
        );
    }

    #[cfg(feature = "stdio")]
    #[tokio::test]
    async fn test_zero_event_buffer_is_rejected() {
        let (client_io, _server_io) = tokio::io::duplex(64);
        let (reader, writer) = tokio::io::split(client_io);
        let transport = codex_rpc_stdio::StdioTransport::from_raw(reader, writer);
        let error = ClientBuilder::new()
            .event_buffer(0)
            .build(transport)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));
    }

    #[cfg(feature = "stdio")]
    #[tokio::test]
    async fn test_spawn_missing_program_is_a_transport_error() {
        let command = tokio::process::Command::new("definitely-not-a-codex-binary-3f9a");
        let error = ClientBuilder::new().spawn(command).await.unwrap_err();
        assert!(error.is_transport());
    }
}
