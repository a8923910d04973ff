//! Client core
//!
//! - `builder`: validated construction from a transport or a command
//! - `config`: timeouts, client identity, event buffering
//! - `core`: the [`Client`] handle and generic request/notify plumbing
//! - `dispatcher`: pending requests, notification listeners, approval routing
//! - `operations`: typed protocol operations built on `core`

pub mod builder;
pub mod config;
pub mod core;
pub(crate) mod dispatcher;
pub mod operations;

pub use builder::ClientBuilder;
pub use config::{ClientConfig, DEFAULT_EVENT_BUFFER};
pub use core::Client;
pub use dispatcher::Subscription;
