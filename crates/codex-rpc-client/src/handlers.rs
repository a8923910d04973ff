//! Handlers for approval requests the server sends to the client.
//!
//! The server asks before it runs a command or applies a file change. Each
//! approval method has at most one handler; configure them together with
//! [`ApprovalHandlers`] and install the set with
//! [`ClientBuilder::approval_handlers`](crate::ClientBuilder::approval_handlers)
//! or [`Client::set_approval_handlers`](crate::Client::set_approval_handlers).
//!
//! A method without a handler is answered with `-32601` (method not found),
//! a handler that returns [`HandlerError`] or panics with `-32603`, and params
//! that do not decode with `-32602`.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use codex_rpc_client::handlers::{
//!     ApprovalHandlers, CommandExecutionApprovalHandler, HandlerResult,
//! };
//! use codex_rpc_client::types::{
//!     CommandExecutionApprovalDecision, CommandExecutionRequestApprovalParams,
//!     CommandExecutionRequestApprovalResponse,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct OnlyCargo;
//!
//! #[async_trait]
//! impl CommandExecutionApprovalHandler for OnlyCargo {
//!     async fn handle_command_execution_approval(
//!         &self,
//!         params: CommandExecutionRequestApprovalParams,
//!     ) -> HandlerResult<CommandExecutionRequestApprovalResponse> {
//!         let cargo = params.command.as_deref().is_some_and(|c| c.starts_with("cargo "));
//!         let decision = if cargo {
//!             CommandExecutionApprovalDecision::Accept
//!         } else {
//!             CommandExecutionApprovalDecision::Decline
//!         };
//!         Ok(CommandExecutionRequestApprovalResponse { decision })
//!     }
//! }
//!
//! let handlers = ApprovalHandlers::new().with_command_execution(Arc::new(OnlyCargo));
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use codex_rpc_protocol::JsonRpcError;
use codex_rpc_protocol::methods::server_request;
use codex_rpc_protocol::types::{
    ApplyPatchApprovalParams, ApplyPatchApprovalResponse, CommandExecutionApprovalDecision,
    CommandExecutionRequestApprovalParams, CommandExecutionRequestApprovalResponse,
    ExecCommandApprovalParams, ExecCommandApprovalResponse, FileChangeApprovalDecision,
    FileChangeRequestApprovalParams, FileChangeRequestApprovalResponse, ReviewDecision,
};
use codex_rpc_transport_traits::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Why an approval handler could not produce a decision
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HandlerError {
    /// The request params did not match the handler's input type
    #[error("Invalid params: {message}")]
    InvalidParams {
        /// Decoder error
        message: String,
    },

    /// The handler failed
    #[error("Handler error: {message}")]
    Generic {
        /// Error message
        message: String,
    },

    /// The handler panicked
    #[error("Handler panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string
        message: String,
    },
}

impl HandlerError {
    /// A handler failure with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Convert the failure into the JSON-RPC error sent back to the server.
    ///
    /// - **-32602**: params did not decode
    /// - **-32603**: the handler failed or panicked
    #[must_use]
    pub fn into_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::InvalidParams { message } => JsonRpcError::invalid_params(message),
            Self::Generic { message } => JsonRpcError::internal_error(message),
            Self::Panicked { message } => {
                JsonRpcError::internal_error(&format!("handler panicked: {message}"))
            }
        }
    }
}

/// Result type for approval handlers
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Decides `item/commandExecution/requestApproval`.
#[async_trait]
pub trait CommandExecutionApprovalHandler: Send + Sync + std::fmt::Debug {
    /// Decide whether the server may run the command.
    async fn handle_command_execution_approval(
        &self,
        params: CommandExecutionRequestApprovalParams,
    ) -> HandlerResult<CommandExecutionRequestApprovalResponse>;
}

/// Decides `item/fileChange/requestApproval`.
#[async_trait]
pub trait FileChangeApprovalHandler: Send + Sync + std::fmt::Debug {
    /// Decide whether the server may apply the change.
    async fn handle_file_change_approval(
        &self,
        params: FileChangeRequestApprovalParams,
    ) -> HandlerResult<FileChangeRequestApprovalResponse>;
}

/// Decides the legacy `execCommandApproval`.
#[async_trait]
pub trait ExecCommandApprovalHandler: Send + Sync + std::fmt::Debug {
    /// Decide whether the server may run the command.
    async fn handle_exec_command_approval(
        &self,
        params: ExecCommandApprovalParams,
    ) -> HandlerResult<ExecCommandApprovalResponse>;
}

/// Decides the legacy `applyPatchApproval`.
#[async_trait]
pub trait ApplyPatchApprovalHandler: Send + Sync + std::fmt::Debug {
    /// Decide whether the server may apply the patch.
    async fn handle_apply_patch_approval(
        &self,
        params: ApplyPatchApprovalParams,
    ) -> HandlerResult<ApplyPatchApprovalResponse>;
}

/// The approval handlers a client answers with, at most one per method.
///
/// Unset slots are valid: the client answers those methods with `-32601`.
#[derive(Debug, Clone, Default)]
pub struct ApprovalHandlers {
    command_execution: Option<Arc<dyn CommandExecutionApprovalHandler>>,
    file_change: Option<Arc<dyn FileChangeApprovalHandler>>,
    exec_command: Option<Arc<dyn ExecCommandApprovalHandler>>,
    apply_patch: Option<Arc<dyn ApplyPatchApprovalHandler>>,
}

impl ApprovalHandlers {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// One handler that answers every approval method.
    pub fn all<H>(handler: Arc<H>) -> Self
    where
        H: CommandExecutionApprovalHandler
            + FileChangeApprovalHandler
            + ExecCommandApprovalHandler
            + ApplyPatchApprovalHandler
            + 'static,
    {
        Self {
            command_execution: Some(handler.clone()),
            file_change: Some(handler.clone()),
            exec_command: Some(handler.clone()),
            apply_patch: Some(handler),
        }
    }

    /// Set the command execution handler
    #[must_use]
    pub fn with_command_execution(
        mut self,
        handler: Arc<dyn CommandExecutionApprovalHandler>,
    ) -> Self {
        debug!("Registered command execution approval handler");
        self.command_execution = Some(handler);
        self
    }

    /// Set the file change handler
    #[must_use]
    pub fn with_file_change(mut self, handler: Arc<dyn FileChangeApprovalHandler>) -> Self {
        debug!("Registered file change approval handler");
        self.file_change = Some(handler);
        self
    }

    /// Set the legacy exec command handler
    #[must_use]
    pub fn with_exec_command(mut self, handler: Arc<dyn ExecCommandApprovalHandler>) -> Self {
        debug!("Registered exec command approval handler");
        self.exec_command = Some(handler);
        self
    }

    /// Set the legacy apply patch handler
    #[must_use]
    pub fn with_apply_patch(mut self, handler: Arc<dyn ApplyPatchApprovalHandler>) -> Self {
        debug!("Registered apply patch approval handler");
        self.apply_patch = Some(handler);
        self
    }

    /// Methods that have a handler
    pub fn configured_methods(&self) -> Vec<&'static str> {
        [
            (
                server_request::COMMAND_EXECUTION_REQUEST_APPROVAL,
                self.command_execution.is_some(),
            ),
            (
                server_request::FILE_CHANGE_REQUEST_APPROVAL,
                self.file_change.is_some(),
            ),
            (
                server_request::EXEC_COMMAND_APPROVAL,
                self.exec_command.is_some(),
            ),
            (
                server_request::APPLY_PATCH_APPROVAL,
                self.apply_patch.is_some(),
            ),
        ]
        .into_iter()
        .filter_map(|(method, set)| set.then_some(method))
        .collect()
    }

    /// `true` when no method has a handler
    pub fn is_empty(&self) -> bool {
        self.configured_methods().is_empty()
    }

    /// Start the handler for `method`, or `None` when the method has none.
    ///
    /// The returned future owns everything it needs, so it outlives any
    /// later replacement of the set.
    pub(crate) fn route(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Option<BoxFuture<'static, HandlerResult<Value>>> {
        match method {
            server_request::COMMAND_EXECUTION_REQUEST_APPROVAL => {
                let handler = Arc::clone(self.command_execution.as_ref()?);
                Some(invoke(params, move |params| async move {
                    handler.handle_command_execution_approval(params).await
                }))
            }
            server_request::FILE_CHANGE_REQUEST_APPROVAL => {
                let handler = Arc::clone(self.file_change.as_ref()?);
                Some(invoke(params, move |params| async move {
                    handler.handle_file_change_approval(params).await
                }))
            }
            server_request::EXEC_COMMAND_APPROVAL => {
                let handler = Arc::clone(self.exec_command.as_ref()?);
                Some(invoke(params, move |params| async move {
                    handler.handle_exec_command_approval(params).await
                }))
            }
            server_request::APPLY_PATCH_APPROVAL => {
                let handler = Arc::clone(self.apply_patch.as_ref()?);
                Some(invoke(params, move |params| async move {
                    handler.handle_apply_patch_approval(params).await
                }))
            }
            _ => None,
        }
    }
}

fn invoke<P, R, F, Fut>(params: Option<Value>, call: F) -> BoxFuture<'static, HandlerResult<Value>>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize,
    F: FnOnce(P) -> Fut + Send + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    Box::pin(async move {
        let params: P = serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| {
            HandlerError::InvalidParams {
                message: e.to_string(),
            }
        })?;
        let response = call(params).await?;
        serde_json::to_value(&response)
            .map_err(|e| HandlerError::generic(format!("failed to encode decision: {e}")))
    })
}

/// Declines every approval request.
///
/// Useful as a safe default for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

#[async_trait]
impl CommandExecutionApprovalHandler for DeclineAll {
    async fn handle_command_execution_approval(
        &self,
        params: CommandExecutionRequestApprovalParams,
    ) -> HandlerResult<CommandExecutionRequestApprovalResponse> {
        debug!(item_id = %params.item_id, "declining command execution");
        Ok(CommandExecutionRequestApprovalResponse {
            decision: CommandExecutionApprovalDecision::Decline,
        })
    }
}

#[async_trait]
impl FileChangeApprovalHandler for DeclineAll {
    async fn handle_file_change_approval(
        &self,
        params: FileChangeRequestApprovalParams,
    ) -> HandlerResult<FileChangeRequestApprovalResponse> {
        debug!(item_id = %params.item_id, "declining file change");
        Ok(FileChangeRequestApprovalResponse {
            decision: FileChangeApprovalDecision::Decline,
        })
    }
}

#[async_trait]
impl ExecCommandApprovalHandler for DeclineAll {
    async fn handle_exec_command_approval(
        &self,
        params: ExecCommandApprovalParams,
    ) -> HandlerResult<ExecCommandApprovalResponse> {
        debug!(call_id = %params.call_id, "denying exec command");
        Ok(ExecCommandApprovalResponse {
            decision: ReviewDecision::Denied,
        })
    }
}

#[async_trait]
impl ApplyPatchApprovalHandler for DeclineAll {
    async fn handle_apply_patch_approval(
        &self,
        params: ApplyPatchApprovalParams,
    ) -> HandlerResult<ApplyPatchApprovalResponse> {
        debug!(call_id = %params.call_id, "denying patch");
        Ok(ApplyPatchApprovalResponse {
            decision: ReviewDecision::Denied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl FileChangeApprovalHandler for Failing {
        async fn handle_file_change_approval(
            &self,
            _params: FileChangeRequestApprovalParams,
        ) -> HandlerResult<FileChangeRequestApprovalResponse> {
            Err(HandlerError::generic("ui went away"))
        }
    }

    fn command_params() -> Value {
        json!({"threadId": "t", "turnId": "u", "itemId": "i", "command": "ls"})
    }

    #[test]
    fn test_error_codes() {
        let invalid = HandlerError::InvalidParams {
            message: "missing field".to_string(),
        };
        assert_eq!(invalid.into_jsonrpc_error().code, -32602);
        assert_eq!(HandlerError::generic("x").into_jsonrpc_error().code, -32603);
        let panicked = HandlerError::Panicked {
            message: "boom".to_string(),
        };
        let error = panicked.into_jsonrpc_error();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("boom"));
    }

    #[test]
    fn test_empty_set_routes_nothing() {
        let handlers = ApprovalHandlers::new();
        assert!(handlers.is_empty());
        for method in server_request::APPROVAL_METHODS {
            assert!(handlers.route(method, Some(command_params())).is_none());
        }
    }

    #[test]
    fn test_configured_methods() {
        let handlers = ApprovalHandlers::new().with_file_change(Arc::new(DeclineAll));
        assert_eq!(
            handlers.configured_methods(),
            vec![server_request::FILE_CHANGE_REQUEST_APPROVAL]
        );
        assert_eq!(
            ApprovalHandlers::all(Arc::new(DeclineAll)).configured_methods(),
            server_request::APPROVAL_METHODS.to_vec()
        );
    }

    #[tokio::test]
    async fn test_route_decodes_and_encodes() {
        let handlers = ApprovalHandlers::all(Arc::new(DeclineAll));
        let future = handlers
            .route(
                server_request::COMMAND_EXECUTION_REQUEST_APPROVAL,
                Some(command_params()),
            )
            .unwrap();
        assert_eq!(future.await.unwrap(), json!({"decision": "decline"}));

        let legacy = handlers
            .route(
                server_request::EXEC_COMMAND_APPROVAL,
                Some(json!({"conversationId": "c", "callId": "k", "command": ["ls"], "cwd": "/"})),
            )
            .unwrap();
        assert_eq!(legacy.await.unwrap(), json!({"decision": "denied"}));
    }

    #[tokio::test]
    async fn test_route_rejects_bad_params() {
        let handlers = ApprovalHandlers::all(Arc::new(DeclineAll));
        let result = handlers
            .route(
                server_request::COMMAND_EXECUTION_REQUEST_APPROVAL,
                Some(json!({"threadId": 5})),
            )
            .unwrap()
            .await;
        assert!(matches!(result, Err(HandlerError::InvalidParams { .. })));
    }

    #[tokio::test]
    async fn test_route_surfaces_handler_error() {
        let handlers = ApprovalHandlers::new().with_file_change(Arc::new(Failing));
        let result = handlers
            .route(
                server_request::FILE_CHANGE_REQUEST_APPROVAL,
                Some(json!({"threadId": "t", "turnId": "u", "itemId": "i"})),
            )
            .unwrap()
            .await;
        assert_eq!(result, Err(HandlerError::generic("ui went away")));
    }
}
