//! # Codex RPC Client
//!
//! Client runtime for driving a Codex agent server over JSON-RPC 2.0.
//!
//! ## Features
//!
//! - Request/response correlation with per-request timeouts and cancellation
//! - Ordered notification listeners with explicit, idempotent unsubscribe
//! - Approval handlers for server-initiated requests, with `-32601` for any
//!   request the application did not configure a handler for
//! - A one-shot `initialize` handshake shared by every caller
//! - Streamed turns: typed [`TurnEvent`]s in arrival order plus a single
//!   terminal [`TurnResult`]
//! - Transport-agnostic: any [`Transport`] works, stdio ships by default
//!
//! ## Architecture
//!
//! ```text
//! Application
//!      |
//! Client / TurnStream (this crate)
//!      |
//! codex-rpc-protocol      wire model and payload types
//!      |
//! codex-rpc-transport-traits + codex-rpc-stdio
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use codex_rpc_client::{ClientBuilder, TurnEvent, TurnOptions};
//! use codex_rpc_client::handlers::{ApprovalHandlers, DeclineAll};
//! use codex_rpc_client::types::UserInput;
//! use futures::StreamExt;
//! use std::sync::Arc;
//! use tokio::process::Command;
//!
//! # async fn example() -> codex_rpc_client::Result<()> {
//! let mut command = Command::new("codex");
//! command.arg("app-server");
//!
//! let client = ClientBuilder::new()
//!     .approval_handlers(ApprovalHandlers::all(Arc::new(DeclineAll)))
//!     .spawn(command)
//!     .await?;
//! client.initialize().await?;
//!
//! let mut turn = client.stream_turn(vec![UserInput::text("list the crates")], TurnOptions::new());
//! let mut events = turn.events();
//! while let Some(event) = events.next().await {
//!     match event? {
//!         TurnEvent::AgentMessageDelta(delta) => print!("{}", delta.delta),
//!         TurnEvent::TurnCompleted(_) => println!(),
//!         _ => {}
//!     }
//! }
//! let result = turn.result().await?;
//! println!("{} items", result.items.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancellation
//!
//! Dropping a request future abandons it: its pending entry is removed and
//! a late response is discarded. Dropping a [`TurnStream`] or firing the
//! token in [`TurnOptions::cancel`] cancels the turn, and by default asks
//! the server to interrupt it.

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

pub mod client;
pub mod error;
pub mod handlers;
pub mod prelude;
pub mod turn;

mod sync;

/// Payload types of the protocol
pub mod types {
    pub use codex_rpc_protocol::types::*;
}

pub use client::{Client, ClientBuilder, ClientConfig, DEFAULT_EVENT_BUFFER, Subscription};
pub use error::{Error, Result, RpcError};
pub use handlers::{ApprovalHandlers, HandlerError, HandlerResult};
pub use turn::{TurnEvent, TurnEvents, TurnOptions, TurnResult, TurnStream};

pub use codex_rpc_protocol::{
    JsonRpcError, JsonRpcErrorCode, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    RequestId, Secret,
};
pub use codex_rpc_transport_traits::{
    TimeoutConfig, Transport, TransportError, TransportMetrics, TransportState,
};
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "stdio")]
pub use codex_rpc_stdio::StdioTransport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
