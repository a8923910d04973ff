//! Transport error types.

use std::time::Duration;
use thiserror::Error;

use crate::config::LimitsConfig;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during transport operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish a connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport is closed, or was closed while the operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to send a message.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive a message.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Failed to serialize or deserialize a message.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The peer violated the wire protocol.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// A write did not complete within the configured timeout.
    #[error(
        "Timed out after {timeout:?} for operation: {operation}. \
         If this is expected, increase the timeout with \
         `TimeoutConfig {{ write: Some(Duration::from_secs({})) }}`",
        timeout.as_secs() * 2
    )]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// The timeout duration that was exceeded
        timeout: Duration,
    },

    /// The transport was configured with invalid parameters.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Outbound message size exceeds the configured maximum limit.
    #[error(
        "Outbound message size ({size} bytes) exceeds maximum allowed ({max} bytes). \
         If this is expected, raise `LimitsConfig::max_outbound_size` or use \
         `LimitsConfig::unlimited()`"
    )]
    OutboundTooLarge {
        /// The actual size of the message in bytes
        size: usize,
        /// The maximum allowed size in bytes
        max: usize,
    },

    /// An inbound line grew past the configured maximum and was skipped.
    #[error(
        "Inbound line exceeds maximum allowed ({max} bytes) and was skipped. \
         If this is expected, raise `LimitsConfig::max_inbound_size` or use \
         `LimitsConfig::unlimited()`"
    )]
    InboundTooLarge {
        /// The maximum allowed size in bytes
        max: usize,
    },

    /// An underlying I/O error occurred.
    #[error("IO error: {0}")]
    Io(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Returns `true` if the transport can no longer carry messages.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::ConnectionFailed(_) | Self::Io(_)
        )
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}

/// Validates that an outbound message does not exceed the configured limit.
///
/// Returns `Ok(())` if the size is within limits or no limit is set.
pub fn validate_outbound_size(size: usize, limits: &LimitsConfig) -> TransportResult<()> {
    if let Some(max_size) = limits.max_outbound_size
        && size > max_size
    {
        return Err(TransportError::OutboundTooLarge {
            size,
            max: max_size,
        });
    }
    Ok(())
}
