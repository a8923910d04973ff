//! Core `Client` implementation
//!
//! `Client` is a cheaply cloneable `Arc` wrapper. Every clone shares one
//! transport, one dispatcher, and one handshake:
//!
//! - the **transport** correlates responses and writes frames
//! - the **dispatcher** allocates ids, tracks requests in flight, fans
//!   notifications out to listeners, and answers approval requests
//! - the **handshake** is a `tokio::sync::OnceCell` that stores the outcome
//!   of the single `initialize` attempt

use std::sync::Arc;

use codex_rpc_protocol::types::InitializeResponse;
use codex_rpc_protocol::{JsonRpcNotification, JsonRpcRequest};
use codex_rpc_transport_traits::{
    BoxFuture, NotificationHandler, RequestHandler, Transport, TransportMetrics, TransportState,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::config::ClientConfig;
use super::dispatcher::{Dispatcher, Subscription};
use crate::error::{Error, Result, RpcError};
use crate::handlers::ApprovalHandlers;

/// State shared by every clone of a [`Client`]
pub(super) struct ClientInner {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) dispatcher: Arc<Dispatcher>,
    pub(super) config: ClientConfig,
    pub(super) handshake: OnceCell<Result<InitializeResponse>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // Without a runtime there is nothing left to close the transport with
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let transport = Arc::clone(&self.transport);
            runtime.spawn(async move {
                if let Err(e) = transport.close().await {
                    debug!(error = %e, "transport close on drop failed");
                }
            });
        }
    }
}

/// A connection to a Codex app-server.
///
/// Build one with [`ClientBuilder`](crate::ClientBuilder). Clones share the
/// connection; the transport closes when [`close`](Self::close) is called or
/// the last clone is dropped.
///
/// ```rust,no_run
/// use codex_rpc_client::{ClientBuilder, TurnOptions};
/// use codex_rpc_client::types::UserInput;
/// use tokio::process::Command;
///
/// # async fn example() -> codex_rpc_client::Result<()> {
/// let mut command = Command::new("codex");
/// command.arg("app-server");
/// let client = ClientBuilder::new().spawn(command).await?;
///
/// let result = client
///     .run_turn(vec![UserInput::text("summarize README.md")], TurnOptions::new())
///     .await?;
/// println!("{}", result.final_response.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    pub(super) inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.inner.transport)
            .field("dispatcher", &self.inner.dispatcher)
            .field("config", &self.inner.config)
            .field("initialized", &self.inner.handshake.initialized())
            .finish()
    }
}

impl Client {
    /// Wire `transport` to a new dispatcher and connect it.
    ///
    /// Handlers are installed before the read loop starts, so no inbound
    /// message can arrive unrouted.
    pub(super) async fn connect_with(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        approvals: ApprovalHandlers,
    ) -> Result<Self> {
        let dispatcher = Dispatcher::new(approvals, tokio::runtime::Handle::current());

        let requests = Arc::clone(&dispatcher);
        let request_handler: RequestHandler =
            Arc::new(move |request: JsonRpcRequest| requests.handle_request(request));
        transport.on_request(request_handler);

        let notifications = Arc::clone(&dispatcher);
        let notification_handler: NotificationHandler =
            Arc::new(move |notification: JsonRpcNotification| {
                notifications.dispatch_notification(&notification);
            });
        transport.on_notify(notification_handler);

        transport.connect().await?;
        debug!(
            transport = %transport.transport_type(),
            endpoint = ?transport.endpoint(),
            "client connected"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                dispatcher,
                config,
                handshake: OnceCell::new(),
            }),
        })
    }

    /// Send a request and decode its result.
    ///
    /// `params` that serialize to `null` are omitted from the request. The
    /// configured request timeout applies; wrap the call in
    /// `tokio::time::timeout` for a shorter deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the transport failed or closed
    /// - [`Error::Timeout`] if the request timeout elapsed first; a late
    ///   response is discarded
    /// - [`Error::Rpc`] if the server answered with an error
    /// - [`Error::Decode`] if `params` or the result did not (de)serialize
    pub async fn send_request<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = encode_params(method, params)?;
        let result = self.request_value(method, params).await?;
        decode_result(method, result)
    }

    /// [`send_request`](Self::send_request), abandoned early when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request), plus [`Error::Cancelled`].
    pub async fn send_request_with_cancel<P, R>(
        &self,
        method: &str,
        params: &P,
        cancel: &CancellationToken,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = encode_params(method, params)?;
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(method, "request cancelled");
                return Err(Error::Cancelled);
            }
            result = self.request_value(method, params) => result?,
        };
        decode_result(method, result)
    }

    /// Send a request with raw params and return the raw result.
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request), without decoding.
    pub async fn request_value(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let guard = self.inner.dispatcher.begin_request(method);
        let id = guard.id().clone();
        trace!(%id, method, "sending request");

        let exchange = self
            .inner
            .transport
            .send(JsonRpcRequest::new(id.clone(), method, params));
        let response = match self.inner.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                debug!(%id, method, timeout_ms = limit.as_millis() as u64, "request timed out");
                Error::Timeout {
                    method: method.to_string(),
                    timeout: limit,
                }
            })??,
            None => exchange.await?,
        };
        drop(guard);

        response.into_result().map_err(|error| {
            debug!(%id, method, code = error.code, "server returned an error");
            Error::Rpc(RpcError::from_jsonrpc(method, error))
        })
    }

    /// Send a notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the write failed, or [`Error::Decode`]
    /// if `params` did not serialize.
    pub async fn notify<P>(&self, method: &str, params: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let params = encode_params(method, params)?;
        self.inner
            .transport
            .notify(JsonRpcNotification::new(method, params))
            .await?;
        Ok(())
    }

    /// Call `listener` for every notification with `method`.
    ///
    /// Any number of listeners may share a method. Each listener runs on its
    /// own task and sees its notifications in arrival order; a listener that
    /// blocks delays only itself.
    pub fn on_notification<F>(&self, method: &str, listener: F) -> Subscription
    where
        F: Fn(&JsonRpcNotification) + Send + Sync + 'static,
    {
        self.on_notifications(&[method], listener)
    }

    /// One listener for several methods, called in the order the
    /// notifications arrived regardless of which method each carries.
    pub fn on_notifications<F>(&self, methods: &[&str], listener: F) -> Subscription
    where
        F: Fn(&JsonRpcNotification) + Send + Sync + 'static,
    {
        self.inner.dispatcher.subscribe(methods, Arc::new(listener))
    }

    /// Like [`on_notification`](Self::on_notification), with params decoded
    /// into `P` first. Notifications that fail to decode are logged and
    /// skipped; other listeners still see them.
    pub fn on_notification_typed<P, F>(&self, method: &str, listener: F) -> Subscription
    where
        P: DeserializeOwned,
        F: Fn(P) + Send + Sync + 'static,
    {
        self.on_notification(method, move |notification: &JsonRpcNotification| {
            let params = notification.params.clone().unwrap_or(Value::Null);
            match serde_json::from_value::<P>(params) {
                Ok(params) => listener(params),
                Err(e) => warn!(
                    method = %notification.method,
                    error = %e,
                    "notification params did not decode"
                ),
            }
        })
    }

    /// Replace every approval handler at once.
    ///
    /// Requests already being handled finish with the handler they started with.
    pub fn set_approval_handlers(&self, handlers: ApprovalHandlers) {
        self.inner.dispatcher.set_approvals(handlers);
    }

    /// Requests written and not yet finished
    pub fn pending_requests(&self) -> usize {
        self.inner.dispatcher.pending_count()
    }

    /// The transport this client talks through
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// The settings this client runs with
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Transport traffic counters
    pub async fn metrics(&self) -> TransportMetrics {
        self.inner.transport.metrics().await
    }

    /// Current transport state
    pub async fn state(&self) -> TransportState {
        self.inner.transport.state().await
    }

    /// Close the transport. In-flight and later calls fail with a transport error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the transport could not shut down cleanly.
    pub async fn close(&self) -> Result<()> {
        debug!("closing client");
        self.inner.transport.close().await?;
        Ok(())
    }

    /// Resolves when the transport closes or fails.
    pub(crate) fn transport_closed(&self) -> BoxFuture<'_, ()> {
        self.inner.transport.closed()
    }
}

fn encode_params<P>(method: &str, params: &P) -> Result<Option<Value>>
where
    P: Serialize + ?Sized,
{
    match serde_json::to_value(params) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(Error::decode(format!("{method} params"), e)),
    }
}

fn decode_result<R: DeserializeOwned>(method: &str, result: Value) -> Result<R> {
    serde_json::from_value(result).map_err(|e| Error::decode(format!("{method} result"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_null_params_are_omitted() {
        assert_eq!(encode_params("m", &()).unwrap(), None);
        assert_eq!(encode_params("m", &None::<u8>).unwrap(), None);
        assert_eq!(
            encode_params("m", &json!({"a": 1})).unwrap(),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_decode_result_names_the_method() {
        let error = decode_result::<u32>("model/list", json!("nope")).unwrap_err();
        match error {
            Error::Decode { context, .. } => assert_eq!(context, "model/list result"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
