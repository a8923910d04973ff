//! # Codex RPC Protocol
//!
//! Wire model for the bidirectional JSON-RPC 2.0 protocol spoken between an
//! application and a Codex app-server.
//!
//! ## Overview
//!
//! - **Messages**: [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcNotification`],
//!   [`JsonRpcError`], and [`JsonRpcMessage`] which classifies inbound documents
//! - **Identifiers**: [`RequestId`], with number equality that ignores representation
//! - **Methods**: [`methods`] holds every method name the runtime sends or answers
//! - **Payloads**: [`types`] holds forward-compatible payload types; unknown union
//!   members round-trip through [`RawVariant`]
//! - **Credentials**: [`Secret`] redacts itself everywhere except on the wire
//!
//! ```rust
//! use codex_rpc_protocol::{JsonRpcMessage, RequestId};
//!
//! let message: JsonRpcMessage = r#"{"id":7.0,"result":{}}"#.parse().unwrap();
//! if let JsonRpcMessage::Response(response) = message {
//!     assert_eq!(response.id, RequestId::from(7i64));
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod jsonrpc;
pub mod methods;
pub mod types;

mod secret;
mod union;

pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcErrorCode, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcResponsePayload, JsonRpcVersion, MessageError,
    MessageKind, RequestId,
};
pub use secret::Secret;
pub use union::RawVariant;
