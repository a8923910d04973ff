//! Typed client operations
//!
//! Each operation is one request with a typed payload:
//!
//! - `connection`: the `initialize` handshake
//! - `threads`: `thread/start`, `thread/resume`
//! - `turns`: `turn/start`, `turn/interrupt`, and the streamed turn engine
//! - `account`: `account/read`, `account/login/start`, `account/logout`, `model/list`
//!
//! Everything except `initialize` requires a completed handshake.

pub mod account;
pub mod connection;
pub mod threads;
pub mod turns;
