//! # Codex RPC Stdio Transport
//!
//! Newline-delimited JSON transport for talking to a Codex app-server.
//!
//! - **Framing**: one UTF-8 JSON document per line, no length prefix, via
//!   `tokio_util::codec::LinesCodec`
//! - **Sources**: the current process's stdin/stdout, a spawned agent server,
//!   or any `AsyncRead`/`AsyncWrite` pair such as `tokio::io::duplex`
//! - **Correlation**: responses complete the `send` that carries the same
//!   [`RequestId`](codex_rpc_protocol::RequestId); late responses for abandoned
//!   requests are dropped
//! - **Logging**: through `tracing`, which never touches stdout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codex_rpc_stdio::StdioTransport;
//! use codex_rpc_transport_traits::Transport;
//! use tokio::process::Command;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut command = Command::new("codex");
//!     command.arg("app-server");
//!     let transport = StdioTransport::spawn(command)?;
//!     transport.connect().await?;
//!     // Hand the transport to a client...
//!     Ok(())
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

mod transport;

pub use transport::StdioTransport;

// Re-export common types for convenience
pub use codex_rpc_transport_traits::{
    Transport, TransportConfig, TransportError, TransportEvent, TransportEventEmitter,
    TransportMetrics, TransportResult, TransportState, TransportType,
};
