//! Core transport trait and handler types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use codex_rpc_protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

use crate::error::TransportResult;
use crate::metrics::TransportMetrics;
use crate::types::{TransportState, TransportType};

/// How often the default [`Transport::closed`] checks the state.
const CLOSED_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A boxed, sendable future, the return type of every async transport operation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Answers a request the peer initiated.
///
/// The transport writes whatever response the future resolves to, so the
/// handler decides the outcome even when it fails internally.
pub type RequestHandler =
    Arc<dyn Fn(JsonRpcRequest) -> BoxFuture<'static, JsonRpcResponse> + Send + Sync>;

/// Receives notifications the peer sends, in arrival order.
pub type NotificationHandler = Arc<dyn Fn(JsonRpcNotification) + Send + Sync>;

/// Duplex exchange of JSON-RPC messages with one peer.
///
/// Implementations must allow any number of concurrent [`send`](Self::send)
/// calls, each resolving to the response carrying its own id. Once
/// [`close`](Self::close) runs, in-flight and later operations fail with
/// [`TransportError::ConnectionClosed`](crate::TransportError::ConnectionClosed).
///
/// Dropping a `send` future abandons the request: the transport forgets the
/// id, and a response that arrives later is discarded.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Returns the type of this transport.
    fn transport_type(&self) -> TransportType;

    /// Returns the current state of the transport.
    fn state(&self) -> BoxFuture<'_, TransportState>;

    /// Starts the read loop. Connecting twice is a no-op.
    fn connect(&self) -> BoxFuture<'_, TransportResult<()>>;

    /// Writes `request` and waits for the response with the same id.
    fn send(&self, request: JsonRpcRequest) -> BoxFuture<'_, TransportResult<JsonRpcResponse>>;

    /// Writes a notification. Nothing is awaited from the peer.
    fn notify(&self, notification: JsonRpcNotification) -> BoxFuture<'_, TransportResult<()>>;

    /// Installs the handler for requests the peer initiates, replacing any previous one.
    ///
    /// Without a handler the transport answers `-32601`.
    fn on_request(&self, handler: RequestHandler);

    /// Installs the handler for notifications the peer sends, replacing any previous one.
    fn on_notify(&self, handler: NotificationHandler);

    /// Stops the transport and fails everything still waiting on it.
    fn close(&self) -> BoxFuture<'_, TransportResult<()>>;

    /// Resolves once the transport is closed or has failed.
    ///
    /// The default polls [`state`](Self::state); implementations that track
    /// their lifecycle should resolve it directly.
    fn closed(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            while !self.state().await.is_terminal() {
                tokio::time::sleep(CLOSED_POLL_INTERVAL).await;
            }
        })
    }

    /// Returns a snapshot of the transport's traffic counters.
    fn metrics(&self) -> BoxFuture<'_, TransportMetrics>;

    /// Returns `true` if the transport is currently in the `Connected` state.
    fn is_connected(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { matches!(self.state().await, TransportState::Connected) })
    }

    /// Returns the endpoint address or identifier for this transport, if applicable.
    fn endpoint(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Transport must stay usable as a trait object
    fn _test_transport_object(_t: &dyn Transport) {}
    fn _test_shared_object(_t: Arc<dyn Transport>) {}

    #[tokio::test]
    async fn test_request_handler_is_shareable() {
        let handler: RequestHandler =
            Arc::new(|request: JsonRpcRequest| -> BoxFuture<'static, JsonRpcResponse> {
                Box::pin(async move { JsonRpcResponse::success(request.id, serde_json::json!({})) })
            });
        let response = handler(JsonRpcRequest::new(1i64.into(), "ping", None)).await;
        assert!(response.is_success());
    }
}
