//! # Codex RPC Transport Traits
//!
//! The transport contract for the Codex app-server client runtime. Concrete
//! transports implement [`Transport`]; the client only ever talks to this trait.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Traits**: [`Transport`], plus the [`RequestHandler`] and [`NotificationHandler`] callbacks
//! - **Types**: [`TransportType`], [`TransportState`], [`TransportConfig`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Config**: [`LimitsConfig`], [`TimeoutConfig`]
//! - **Observability**: [`TransportEvent`], [`TransportEventEmitter`], [`TransportMetrics`], [`AtomicMetrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codex_rpc_transport_traits::{BoxFuture, Transport, TransportResult};
//!
//! #[derive(Debug)]
//! struct MyTransport { /* ... */ }
//!
//! impl Transport for MyTransport {
//!     fn transport_type(&self) -> TransportType { /* ... */ }
//!     // ... other trait methods
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

mod config;
mod error;
mod events;
mod metrics;
mod traits;
mod types;

pub use config::{LimitsConfig, TimeoutConfig};
pub use error::{TransportError, TransportResult};
pub use events::{TransportEvent, TransportEventEmitter};
pub use metrics::{AtomicMetrics, TransportMetrics};
pub use traits::{BoxFuture, NotificationHandler, RequestHandler, Transport};
pub use types::{TransportConfig, TransportState, TransportType};

pub use error::validate_outbound_size;
