//! Client configuration

use std::time::Duration;

use codex_rpc_protocol::types::ClientInfo;
use codex_rpc_transport_traits::TimeoutConfig;

/// Default capacity of a turn's event channel
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Settings a client runs with
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for each request; `None` waits forever
    pub request_timeout: Option<Duration>,

    /// Identity sent in the `initialize` handshake
    pub client_info: ClientInfo,

    /// Capacity of each turn's event channel
    pub event_buffer: usize,

    /// Send `turn/interrupt` when a running turn is cancelled
    pub interrupt_on_cancel: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: TimeoutConfig::default().request,
            client_info: ClientInfo::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            interrupt_on_cancel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.event_buffer, 64);
        assert!(config.interrupt_on_cancel);
        assert_eq!(config.client_info.name, "codex-rpc");
    }
}
