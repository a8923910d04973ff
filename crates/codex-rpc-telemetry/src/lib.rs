//! Logging bootstrap for applications embedding the Codex RPC client
//!
//! The client crates only emit `tracing` events; they never install a
//! subscriber. This crate installs one for applications that have none:
//!
//! - **Filtering**: `EnvFilter` directives, with `RUST_LOG` taking precedence
//! - **Output**: JSON or human readable, to stderr by default so stdout stays
//!   free for a protocol stream
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use codex_rpc_telemetry::TelemetryConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let _guard = TelemetryConfig::builder()
//!         .service_name("review-bot")
//!         .log_level("info,codex_rpc_client=debug")
//!         .build()
//!         .init()?;
//!
//!     codex_rpc_telemetry::info!("ready");
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

mod config;
mod error;
mod init;

pub use config::{DEFAULT_LOG_LEVEL, TelemetryConfig, TelemetryConfigBuilder};
pub use error::{TelemetryError, TelemetryResult};
pub use init::TelemetryGuard;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, instrument};
pub use tracing::{debug, error, info, trace, warn};
pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::config::{TelemetryConfig, TelemetryConfigBuilder};
    pub use super::error::{TelemetryError, TelemetryResult};
    pub use super::init::TelemetryGuard;
    pub use tracing::{Instrument, debug, error, info, instrument, trace, warn};
}
