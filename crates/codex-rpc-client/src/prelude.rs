//! Commonly used types in one import
//!
//! ```rust,no_run
//! use codex_rpc_client::prelude::*;
//!
//! # async fn example(client: Client) -> Result<()> {
//! let result = client
//!     .run_turn(vec![UserInput::text("hello")], TurnOptions::new())
//!     .await?;
//! println!("{:?}", result.final_response);
//! # Ok(())
//! # }
//! ```

pub use crate::{CRATE_NAME, VERSION};

pub use crate::{
    ApprovalHandlers, CancellationToken, Client, ClientBuilder, ClientConfig, Error,
    HandlerError, HandlerResult, Result, RpcError, Subscription, TurnEvent, TurnEvents,
    TurnOptions, TurnResult, TurnStream,
};

pub use crate::handlers::{
    ApplyPatchApprovalHandler, CommandExecutionApprovalHandler, DeclineAll,
    ExecCommandApprovalHandler, FileChangeApprovalHandler,
};

pub use crate::types::{
    ClientInfo, InitializeResponse, ThreadItem, ThreadStartParams, Turn, TurnStatus, UserInput,
};

#[cfg(feature = "stdio")]
pub use crate::StdioTransport;
