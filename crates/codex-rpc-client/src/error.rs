//! Client error types.

use std::fmt;
use std::time::Duration;

use codex_rpc_protocol::types::TurnError;
use codex_rpc_protocol::{JsonRpcError, JsonRpcErrorCode};
use codex_rpc_transport_traits::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a client operation can fail with.
///
/// `Clone` so one outcome (a handshake, a finished turn) can be handed to
/// every waiter that shares it.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// The transport failed. Fatal to every operation sharing it.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The local deadline elapsed. The server may still have done the work.
    #[error("{method} timed out after {timeout:?}")]
    Timeout {
        /// Method that was abandoned
        method: String,
        /// The deadline that elapsed
        timeout: Duration,
    },

    /// The server answered with a JSON-RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// A payload did not have the expected shape.
    #[error("failed to decode {context}: {message}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Decoder message
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The turn finished with a turn-level error.
    #[error("turn failed: {0}")]
    TurnFailed(TurnError),

    /// The turn event sequence was already taken.
    #[error("turn event stream already consumed")]
    StreamConsumed,

    /// The `initialize` handshake failed. Every later call sees the same error.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The client was configured with values it cannot use.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn decode(context: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: error.to_string(),
        }
    }

    /// `true` for a local deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// `true` when the transport failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The JSON-RPC error code, for errors the server returned.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            Self::Rpc(rpc) => Some(rpc.code),
            _ => None,
        }
    }

    /// `true` when the server does not implement the method.
    pub fn is_method_not_found(&self) -> bool {
        self.rpc_code() == Some(JsonRpcErrorCode::MethodNotFound.code())
    }
}

/// A JSON-RPC error returned by the server, with the method that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} failed with {code}: {message}")]
pub struct RpcError {
    /// Method the request was for
    pub method: String,
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Extra data attached by the server
    pub data: Option<Value>,
}

impl RpcError {
    pub(crate) fn from_jsonrpc(method: &str, error: JsonRpcError) -> Self {
        Self {
            method: method.to_string(),
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }

    /// The standard classification of [`code`](Self::code).
    pub fn kind(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from(self.code)
    }
}
