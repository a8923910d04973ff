//! Newline-delimited JSON transport implementation.
//!
//! This module provides [`StdioTransport`], one JSON-RPC message per line over
//! a pair of byte streams.
//!
//! # Task layout
//!
//! - one **read loop** per connection decodes lines and routes them: responses
//!   complete the matching pending request, peer requests are answered on their
//!   own spawned task, notifications go to the pump
//! - one **notification pump** hands notifications to the installed handler in
//!   arrival order, away from the read loop
//! - writes go through a single `tokio::sync::Mutex` around the framed writer,
//!   so concurrent senders never interleave partial lines
//!
//! State, config and the correlation table sit behind `parking_lot` locks that
//! are never held across `.await`.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use codex_rpc_protocol::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
};
use codex_rpc_transport_traits::{
    AtomicMetrics, BoxFuture, NotificationHandler, RequestHandler, Transport, TransportConfig,
    TransportError, TransportEventEmitter, TransportMetrics, TransportResult, TransportState,
    TransportType, validate_outbound_size,
};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex as TokioMutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

// Boxed so process stdio, child pipes and in-memory streams share one type
type BoxedAsyncRead = Pin<Box<dyn AsyncRead + Send + 'static>>;
type BoxedAsyncWrite = Pin<Box<dyn AsyncWrite + Send + 'static>>;
type LineReader = FramedRead<BoxedAsyncRead, LinesCodec>;
type LineWriter = FramedWrite<BoxedAsyncWrite, LinesCodec>;

/// How much of a malformed line ends up in logs and events.
const LINE_PREVIEW_CHARS: usize = 200;

/// Source of streams for the transport
enum StreamSource {
    /// Use the current process's stdin/stdout
    ProcessStdio,
    /// Use raw streams (already boxed)
    Raw {
        reader: BoxedAsyncRead,
        writer: BoxedAsyncWrite,
    },
    /// Taken by `connect`
    Consumed,
}

impl std::fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProcessStdio => write!(f, "ProcessStdio"),
            Self::Raw { .. } => f
                .debug_struct("Raw")
                .field("reader", &"<async reader>")
                .field("writer", &"<async writer>")
                .finish(),
            Self::Consumed => write!(f, "Consumed"),
        }
    }
}

/// Everything the background tasks share with the transport handle.
struct Shared {
    transport_type: TransportType,
    endpoint: String,
    state: Mutex<TransportState>,
    config: Mutex<TransportConfig>,
    events: Mutex<TransportEventEmitter>,
    metrics: AtomicMetrics,
    writer: TokioMutex<Option<LineWriter>>,
    pending: Mutex<HashMap<RequestId, oneshot::Sender<JsonRpcResponse>>>,
    request_handler: RwLock<Option<RequestHandler>>,
    notification_handler: RwLock<Option<NotificationHandler>>,
    closed: CancellationToken,
}

impl Shared {
    fn emitter(&self) -> TransportEventEmitter {
        self.events.lock().clone()
    }

    fn state(&self) -> TransportState {
        self.state.lock().clone()
    }

    /// Terminal states are sticky: nothing moves a closed transport back.
    fn set_state(&self, new_state: TransportState) {
        {
            let mut state = self.state.lock();
            if *state == new_state || state.is_terminal() {
                return;
            }
            trace!(
                endpoint = %self.endpoint,
                "transport state: {} -> {}", *state, new_state
            );
            *state = new_state.clone();
            if new_state.is_terminal() {
                self.closed.cancel();
            }
        }

        let events = self.emitter();
        match new_state {
            TransportState::Connected => {
                events.emit_connected(self.transport_type, self.endpoint.clone());
            }
            TransportState::Closed => {
                events.emit_disconnected(self.transport_type, self.endpoint.clone(), None);
            }
            TransportState::Failed { reason } => {
                events.emit_disconnected(self.transport_type, self.endpoint.clone(), Some(reason));
            }
            _ => {}
        }
    }

    fn ensure_connected(&self) -> TransportResult<()> {
        let state = self.state.lock();
        match &*state {
            TransportState::Connected => Ok(()),
            terminal if terminal.is_terminal() => Err(TransportError::ConnectionClosed),
            other => Err(TransportError::ConnectionFailed(format!(
                "Transport not connected: {other}"
            ))),
        }
    }

    /// Fails every waiter by dropping its completion signal.
    fn drain_pending(&self) {
        let drained = std::mem::take(&mut *self.pending.lock());
        if !drained.is_empty() {
            debug!(
                endpoint = %self.endpoint,
                count = drained.len(),
                "failing requests still awaiting a response"
            );
        }
    }

    /// Stops writing, fails waiters, and leaves the transport in `final_state`.
    async fn shut_down(&self, final_state: TransportState) {
        self.set_state(final_state);
        if let Some(mut writer) = self.writer.lock().await.take()
            && let Err(e) = SinkExt::<String>::close(&mut writer).await
        {
            trace!(error = %e, "closing writer");
        }
        self.drain_pending();
    }

    async fn write_message(&self, message: &JsonRpcMessage) -> TransportResult<()> {
        let line = message.to_line()?;
        let size = line.len();
        let write_timeout = {
            let config = self.config.lock();
            validate_outbound_size(size, &config.limits)?;
            config.timeouts.write
        };

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::ConnectionClosed)?;
        let sent = match write_timeout {
            Some(timeout) => tokio::time::timeout(timeout, writer.send(line))
                .await
                .map_err(|_| TransportError::Timeout {
                    operation: "write".to_string(),
                    timeout,
                }),
            None => Ok(writer.send(line).await),
        };

        let failure = match sent {
            Ok(Ok(())) => None,
            Ok(Err(LinesCodecError::Io(e))) => Some(TransportError::from(e)),
            Ok(Err(e)) => Some(TransportError::SendFailed(e.to_string())),
            Err(timeout) => Some(timeout),
        };
        if let Some(err) = failure {
            // A partial line may be on the wire; framing is gone
            guard.take();
            drop(guard);
            error!(endpoint = %self.endpoint, error = %err, "write failed");
            self.shut_down(TransportState::Failed {
                reason: err.to_string(),
            })
            .await;
            return Err(err);
        }
        drop(guard);

        let (id, method) = message_meta(message);
        self.metrics.record_sent(size);
        self.emitter().emit_message_sent(id, method, size);
        trace!(size, "sent message");
        Ok(())
    }

    fn complete(&self, response: JsonRpcResponse) {
        let waiter = self.pending.lock().remove(&response.id);
        match waiter {
            Some(waiter) => {
                if waiter.send(response).is_err() {
                    trace!("waiter went away before its response arrived");
                }
            }
            None => {
                self.metrics
                    .orphaned_responses
                    .fetch_add(1, Ordering::Relaxed);
                if response.id.is_null() {
                    warn!(
                        error = ?response.error_object(),
                        "peer reported an error without a request id"
                    );
                } else {
                    debug!(
                        id = %response.id,
                        "discarding response for unknown or expired request"
                    );
                }
            }
        }
    }

    fn answer(self: &Arc<Self>, request: JsonRpcRequest) {
        let handler = self.request_handler.read().clone();
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let id = request.id.clone();
            let method = request.method.clone();
            let response = match handler {
                Some(handler) => handler(request).await,
                None => {
                    debug!(%method, "no request handler installed");
                    JsonRpcResponse::error(id.clone(), JsonRpcError::method_not_found(&method))
                }
            };
            if let Err(e) = shared
                .write_message(&JsonRpcMessage::Response(response))
                .await
            {
                warn!(%id, %method, error = %e, "failed to answer peer request");
            }
        });
    }

    fn dispatch_line(
        self: &Arc<Self>,
        line: &str,
        notifications: &mpsc::UnboundedSender<JsonRpcNotification>,
    ) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.metrics.record_received(line.len());

        let message = match line.parse::<JsonRpcMessage>() {
            Ok(message) => message,
            Err(e) => {
                self.metrics
                    .malformed_messages
                    .fetch_add(1, Ordering::Relaxed);
                let preview = preview(line);
                error!(error = %e, line = %preview, "malformed inbound line");
                self.emitter()
                    .emit_error(TransportError::ProtocolError(e.to_string()), Some(preview));
                return;
            }
        };

        let (id, method) = message_meta(&message);
        self.emitter().emit_message_received(id, method, line.len());

        match message {
            JsonRpcMessage::Response(response) => self.complete(response),
            JsonRpcMessage::Request(request) => {
                trace!(id = %request.id, method = %request.method, "peer request");
                self.answer(request);
            }
            JsonRpcMessage::Notification(notification) => {
                trace!(method = %notification.method, "notification");
                if notifications.send(notification).is_err() {
                    debug!("notification pump stopped");
                }
            }
        }
    }
}

fn message_meta(message: &JsonRpcMessage) -> (Option<RequestId>, Option<String>) {
    match message {
        JsonRpcMessage::Request(request) => (Some(request.id.clone()), Some(request.method.clone())),
        JsonRpcMessage::Response(response) => (Some(response.id.clone()), None),
        JsonRpcMessage::Notification(notification) => (None, Some(notification.method.clone())),
    }
}

fn preview(line: &str) -> String {
    line.chars().take(LINE_PREVIEW_CHARS).collect()
}

async fn read_loop(
    shared: Arc<Shared>,
    mut reader: LineReader,
    notifications: mpsc::UnboundedSender<JsonRpcNotification>,
) {
    let max_inbound = shared.config.lock().limits.max_inbound_size;
    // FramedRead yields one `None` after a decode error before it resumes
    let mut resuming = false;
    let reason = loop {
        let item = reader.next().await;
        if std::mem::take(&mut resuming) && item.is_none() {
            trace!("line reader resumed after a decode error");
            continue;
        }
        match item {
            None => break "peer closed the stream".to_string(),
            Some(Ok(line)) => shared.dispatch_line(&line, &notifications),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                resuming = true;
                shared
                    .metrics
                    .malformed_messages
                    .fetch_add(1, Ordering::Relaxed);
                let err = TransportError::InboundTooLarge {
                    max: max_inbound.unwrap_or_default(),
                };
                error!(error = %err, "skipping oversized inbound line");
                shared
                    .emitter()
                    .emit_error(err, Some("inbound line".to_string()));
            }
            Some(Err(LinesCodecError::Io(e))) => {
                error!(error = %e, "failed to read from peer");
                shared.emitter().emit_error(
                    TransportError::ReceiveFailed(e.to_string()),
                    Some("read loop".to_string()),
                );
                break e.to_string();
            }
        }
    };

    debug!(endpoint = %shared.endpoint, %reason, "read loop finished");
    shared.shut_down(TransportState::Failed { reason }).await;
}

async fn notification_pump(
    shared: Arc<Shared>,
    mut notifications: mpsc::UnboundedReceiver<JsonRpcNotification>,
) {
    while let Some(notification) = notifications.recv().await {
        let Some(handler) = shared.notification_handler.read().clone() else {
            trace!(method = %notification.method, "no notification handler installed");
            continue;
        };
        let method = notification.method.clone();
        if std::panic::catch_unwind(AssertUnwindSafe(|| handler(notification))).is_err() {
            error!(%method, "notification handler panicked");
        }
    }
}

/// Removes a request from the correlation table when its `send` future ends,
/// whether it completed, failed, or was dropped by a timeout.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.shared.pending.lock().remove(&self.id).is_some() {
            trace!(id = %self.id, "request abandoned before its response arrived");
        }
    }
}

/// JSON-RPC over newline-delimited JSON.
///
/// Supports communication over:
/// - the current process's stdin/stdout ([`new`](Self::new))
/// - a spawned agent server ([`spawn`](Self::spawn), [`from_child`](Self::from_child))
/// - any reader/writer pair ([`from_raw`](Self::from_raw))
///
/// # Examples
///
/// ```rust,ignore
/// use tokio::process::Command;
/// use codex_rpc_stdio::StdioTransport;
///
/// let mut command = Command::new("codex");
/// command.arg("app-server");
/// let transport = StdioTransport::spawn(command)?;
/// transport.connect().await?;
/// ```
pub struct StdioTransport {
    shared: Arc<Shared>,
    source: Mutex<StreamSource>,
    child: TokioMutex<Option<Child>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("transport_type", &self.shared.transport_type)
            .field("endpoint", &self.shared.endpoint)
            .field("state", &self.shared.state())
            .field("config", &*self.shared.config.lock())
            .field("pending", &self.shared.pending.lock().len())
            .field("source", &*self.source.lock())
            .field("child", &"<Child>")
            .finish()
    }
}

impl StdioTransport {
    fn build(source: StreamSource, transport_type: TransportType, endpoint: String) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport_type,
                endpoint,
                state: Mutex::new(TransportState::Disconnected),
                config: Mutex::new(TransportConfig::default()),
                events: Mutex::new(TransportEventEmitter::default()),
                metrics: AtomicMetrics::new(),
                writer: TokioMutex::new(None),
                pending: Mutex::new(HashMap::new()),
                request_handler: RwLock::new(None),
                notification_handler: RwLock::new(None),
                closed: CancellationToken::new(),
            }),
            source: Mutex::new(source),
            child: TokioMutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Create a transport over the current process's stdin/stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::build(
            StreamSource::ProcessStdio,
            TransportType::Stdio,
            "stdio://".to_string(),
        )
    }

    /// Create a transport over raw async read/write streams.
    ///
    /// When talking to a child process, `reader` is the child's **stdout** and
    /// `writer` is the child's **stdin**.
    pub fn from_raw<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + 'static,
        W: AsyncWrite + Send + 'static,
    {
        Self::build(
            StreamSource::Raw {
                reader: Box::pin(reader),
                writer: Box::pin(writer),
            },
            TransportType::Stream,
            "stream://".to_string(),
        )
    }

    /// Create a transport over the pipes of a child the caller manages.
    ///
    /// The child must have been spawned with `stdin(Stdio::piped())` and
    /// `stdout(Stdio::piped())`. Closing the transport does not kill it.
    ///
    /// # Errors
    ///
    /// Returns an error if the child's stdin or stdout was not piped.
    pub fn from_child(child: &mut Child) -> TransportResult<Self> {
        let stdin = child.stdin.take().ok_or_else(|| {
            TransportError::ConfigurationError(
                "Child process stdin was not piped. Use Stdio::piped() when spawning.".to_string(),
            )
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::ConfigurationError(
                "Child process stdout was not piped. Use Stdio::piped() when spawning.".to_string(),
            )
        })?;

        let endpoint = match child.id() {
            Some(pid) => format!("process://{pid}"),
            None => "process://".to_string(),
        };
        Ok(Self::build(
            StreamSource::Raw {
                reader: Box::pin(stdout),
                writer: Box::pin(stdin),
            },
            TransportType::ChildProcess,
            endpoint,
        ))
    }

    /// Spawn an agent server and talk to it over its stdin/stdout.
    ///
    /// Stdin and stdout are piped; stderr is left as configured on `command`
    /// (inherited by default). The transport owns the child and kills it on
    /// [`close`](Transport::close) or drop.
    pub fn spawn(mut command: Command) -> TransportResult<Self> {
        let program = command.as_std().get_program().to_string_lossy().into_owned();
        command
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            TransportError::ConnectionFailed(format!("failed to spawn {program}: {e}"))
        })?;
        debug!(%program, pid = ?child.id(), "spawned agent server");

        let mut transport = Self::from_child(&mut child)?;
        *transport.child.get_mut() = Some(child);
        Ok(transport)
    }

    /// Replace the limits and timeouts.
    #[must_use]
    pub fn with_config(self, config: TransportConfig) -> Self {
        *self.shared.config.lock() = config;
        self
    }

    /// Publish lifecycle, traffic and decode-failure events to `emitter`.
    #[must_use]
    pub fn with_event_emitter(self, emitter: TransportEventEmitter) -> Self {
        *self.shared.events.lock() = emitter;
        self
    }

    /// Requests written and still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.lock().len()
    }

    async fn start(&self) -> TransportResult<()> {
        let source = std::mem::replace(&mut *self.source.lock(), StreamSource::Consumed);
        let (reader, writer): (BoxedAsyncRead, BoxedAsyncWrite) = match source {
            StreamSource::ProcessStdio => {
                (Box::pin(tokio::io::stdin()), Box::pin(tokio::io::stdout()))
            }
            StreamSource::Raw { reader, writer } => (reader, writer),
            StreamSource::Consumed => {
                return Err(TransportError::ConfigurationError(
                    "Streams already consumed by an earlier connect".to_string(),
                ));
            }
        };

        let codec = match self.shared.config.lock().limits.max_inbound_size {
            Some(max) => LinesCodec::new_with_max_length(max),
            None => LinesCodec::new(),
        };
        *self.shared.writer.lock().await = Some(FramedWrite::new(writer, LinesCodec::new()));

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(notification_pump(Arc::clone(&self.shared), notify_rx));
        let reader = tokio::spawn(read_loop(
            Arc::clone(&self.shared),
            FramedRead::new(reader, codec),
            notify_tx,
        ));
        self.tasks.lock().extend([pump, reader]);
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Transport for StdioTransport {
    fn transport_type(&self) -> TransportType {
        self.shared.transport_type
    }

    fn state(&self) -> BoxFuture<'_, TransportState> {
        Box::pin(async move { self.shared.state() })
    }

    fn connect(&self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            match self.shared.state() {
                TransportState::Connected => return Ok(()),
                TransportState::Connecting => {
                    return Err(TransportError::ConnectionFailed(
                        "connect already in progress".to_string(),
                    ));
                }
                state if state.is_terminal() => return Err(TransportError::ConnectionClosed),
                _ => {}
            }

            self.shared.set_state(TransportState::Connecting);
            match self.start().await {
                Ok(()) => {
                    self.shared.set_state(TransportState::Connected);
                    debug!(endpoint = %self.shared.endpoint, "transport connected");
                    Ok(())
                }
                Err(e) => {
                    error!(endpoint = %self.shared.endpoint, error = %e, "failed to connect");
                    self.shared.set_state(TransportState::Failed {
                        reason: e.to_string(),
                    });
                    Err(e)
                }
            }
        })
    }

    fn send(&self, request: JsonRpcRequest) -> BoxFuture<'_, TransportResult<JsonRpcResponse>> {
        Box::pin(async move {
            self.shared.ensure_connected()?;

            let id = request.id.clone();
            let (tx, rx) = oneshot::channel();
            {
                let mut pending = self.shared.pending.lock();
                if pending.contains_key(&id) {
                    return Err(TransportError::ProtocolError(format!(
                        "request id {id} is already in flight"
                    )));
                }
                pending.insert(id.clone(), tx);
            }
            let _guard = PendingGuard {
                shared: &self.shared,
                id,
            };

            let started = Instant::now();
            self.shared
                .write_message(&JsonRpcMessage::Request(request))
                .await?;
            let response = rx.await.map_err(|_| TransportError::ConnectionClosed)?;
            self.shared
                .metrics
                .update_latency_us(started.elapsed().as_micros() as u64);
            Ok(response)
        })
    }

    fn notify(&self, notification: JsonRpcNotification) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.shared.ensure_connected()?;
            self.shared
                .write_message(&JsonRpcMessage::Notification(notification))
                .await
        })
    }

    fn on_request(&self, handler: RequestHandler) {
        *self.shared.request_handler.write() = Some(handler);
    }

    fn on_notify(&self, handler: NotificationHandler) {
        *self.shared.notification_handler.write() = Some(handler);
    }

    fn close(&self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if self.shared.state() == TransportState::Closed {
                return Ok(());
            }
            self.shared.set_state(TransportState::Disconnecting);

            let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
            for task in tasks {
                task.abort();
            }
            self.shared.shut_down(TransportState::Closed).await;

            if let Some(mut child) = self.child.lock().await.take() {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill agent server");
                } else {
                    debug!(endpoint = %self.shared.endpoint, "agent server stopped");
                }
            }
            Ok(())
        })
    }

    fn closed(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shared.closed.cancelled())
    }

    fn metrics(&self) -> BoxFuture<'_, TransportMetrics> {
        Box::pin(async move {
            let mut snapshot = self.shared.metrics.snapshot();
            snapshot.pending_requests = self.shared.pending.lock().len() as u64;
            snapshot
        })
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.shared.endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_rpc_transport_traits::{LimitsConfig, TimeoutConfig, TransportEvent};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

    struct Peer {
        lines: Lines<BufReader<DuplexStream>>,
        writer: DuplexStream,
    }

    impl Peer {
        async fn read(&mut self) -> Value {
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }

        async fn write(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }
    }

    fn pair() -> (StdioTransport, Peer) {
        let (client_write, peer_read) = tokio::io::duplex(64 * 1024);
        let (peer_write, client_read) = tokio::io::duplex(64 * 1024);
        let transport = StdioTransport::from_raw(client_read, client_write);
        let peer = Peer {
            lines: BufReader::new(peer_read).lines(),
            writer: peer_write,
        };
        (transport, peer)
    }

    fn request(id: i64, method: &str) -> JsonRpcRequest {
        JsonRpcRequest::new(RequestId::from(id), method, Some(json!({})))
    }

    #[test]
    fn test_transport_creation() {
        let transport = StdioTransport::new();
        assert_eq!(transport.transport_type(), TransportType::Stdio);
        assert_eq!(transport.endpoint().as_deref(), Some("stdio://"));

        let (transport, _peer) = pair();
        assert_eq!(transport.transport_type(), TransportType::Stream);
        let debug = format!("{transport:?}");
        assert!(debug.contains("<async reader>"), "{debug}");
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        let (transport, _peer) = pair();
        assert_eq!(transport.state().await, TransportState::Disconnected);
        let err = transport.send(request(1, "ping")).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed(_)), "{err}");
    }

    #[tokio::test]
    async fn test_out_of_order_responses_reach_their_callers() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();
        assert!(transport.is_connected().await);

        let server = async {
            let first = peer.read().await;
            let second = peer.read().await;
            for message in [second, first] {
                let id = message["id"].clone();
                peer.write(&json!({"id": id, "result": {"echo": id}}).to_string())
                    .await;
            }
        };
        let (a, b, ()) = tokio::join!(
            transport.send(request(1, "a")),
            transport.send(request(2, "b")),
            server
        );

        assert_eq!(a.unwrap().result(), Some(&json!({"echo": 1})));
        assert_eq!(b.unwrap().result(), Some(&json!({"echo": 2})));
        assert_eq!(transport.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_float_id_matches_integer_request() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();

        let server = async {
            let message = peer.read().await;
            assert_eq!(message["jsonrpc"], "2.0");
            peer.write(r#"{"id":7.0,"result":"ok"}"#).await;
        };
        let (response, ()) = tokio::join!(transport.send(request(7, "x")), server);
        assert_eq!(response.unwrap().result(), Some(&json!("ok")));
    }

    #[tokio::test]
    async fn test_malformed_line_is_reported_and_skipped() {
        let (emitter, mut events) = TransportEventEmitter::new();
        let (transport, mut peer) = pair();
        let transport = transport.with_event_emitter(emitter);
        transport.connect().await.unwrap();

        let server = async {
            peer.read().await;
            peer.write("this is not json").await;
            peer.write(r#"[{"id":1,"result":1}]"#).await;
            peer.write(r#"{"id":1,"result":true}"#).await;
        };
        let (response, ()) = tokio::join!(transport.send(request(1, "x")), server);
        assert!(response.unwrap().is_success());

        let metrics = transport.metrics().await;
        assert_eq!(metrics.malformed_messages, 2);

        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if let TransportEvent::Error { error, context } = event {
                assert!(matches!(error, TransportError::ProtocolError(_)));
                assert!(context.is_some());
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_peer_request_without_handler_gets_method_not_found() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();

        peer.write(r#"{"jsonrpc":"2.0","id":"srv-1","method":"item/tool/call","params":{}}"#)
            .await;
        let reply = peer.read().await;
        assert_eq!(reply["id"], "srv-1");
        assert_eq!(reply["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_peer_request_answered_by_handler() {
        let (transport, mut peer) = pair();
        transport.on_request(Arc::new(
            |request: JsonRpcRequest| -> BoxFuture<'static, JsonRpcResponse> {
                Box::pin(async move {
                    JsonRpcResponse::success(request.id, json!({"method": request.method}))
                })
            },
        ));
        transport.connect().await.unwrap();

        peer.write(r#"{"id":5,"method":"execCommandApproval","params":{}}"#)
            .await;
        let reply = peer.read().await;
        assert_eq!(
            reply,
            json!({"jsonrpc": "2.0", "id": 5, "result": {"method": "execCommandApproval"}})
        );
    }

    #[tokio::test]
    async fn test_notifications_arrive_in_order() {
        let (transport, mut peer) = pair();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.on_notify(Arc::new(move |notification: JsonRpcNotification| {
            let _ = tx.send(notification.method);
        }));
        transport.connect().await.unwrap();

        for n in 0..20 {
            peer.write(&json!({"method": format!("n/{n}")}).to_string())
                .await;
        }
        for n in 0..20 {
            assert_eq!(rx.recv().await.unwrap(), format!("n/{n}"));
        }
    }

    #[tokio::test]
    async fn test_panicking_notification_handler_does_not_stop_pump() {
        let (transport, mut peer) = pair();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.on_notify(Arc::new(move |notification: JsonRpcNotification| {
            assert_ne!(notification.method, "boom", "listener exploded");
            let _ = tx.send(notification.method);
        }));
        transport.connect().await.unwrap();

        peer.write(r#"{"method":"boom"}"#).await;
        peer.write(r#"{"method":"after"}"#).await;
        assert_eq!(rx.recv().await.unwrap(), "after");
    }

    #[tokio::test]
    async fn test_close_fails_in_flight_and_later_sends() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();

        let closer = async {
            peer.read().await;
            transport.close().await.unwrap();
        };
        let (result, ()) = tokio::join!(transport.send(request(1, "slow")), closer);
        assert_eq!(result.unwrap_err(), TransportError::ConnectionClosed);
        assert_eq!(transport.state().await, TransportState::Closed);

        let err = transport.send(request(2, "late")).await.unwrap_err();
        assert_eq!(err, TransportError::ConnectionClosed);
        assert_eq!(
            transport.connect().await.unwrap_err(),
            TransportError::ConnectionClosed
        );
    }

    #[tokio::test]
    async fn test_peer_eof_fails_pending_request() {
        let (transport, peer) = pair();
        transport.connect().await.unwrap();

        let Peer { mut lines, writer } = peer;
        let hang_up = async move {
            lines.next_line().await.unwrap();
            drop(writer);
        };
        let (result, ()) = tokio::join!(transport.send(request(1, "x")), hang_up);
        assert_eq!(result.unwrap_err(), TransportError::ConnectionClosed);
        assert!(transport.state().await.is_terminal());
        tokio::time::timeout(Duration::from_secs(1), transport.closed())
            .await
            .expect("closed() resolves after EOF");
    }

    #[tokio::test]
    async fn test_abandoned_request_discards_late_response() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            transport.send(request(1, "slow")),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(transport.pending_requests(), 0);

        let server = async {
            peer.read().await;
            peer.write(r#"{"id":1,"result":"too late"}"#).await;
            peer.read().await;
            peer.write(r#"{"id":2,"result":"fresh"}"#).await;
        };
        let (response, ()) = tokio::join!(transport.send(request(2, "next")), server);
        assert_eq!(response.unwrap().result(), Some(&json!("fresh")));

        let metrics = transport.metrics().await;
        assert_eq!(metrics.orphaned_responses, 1);
        assert_eq!(metrics.pending_requests, 0);
    }

    #[tokio::test]
    async fn test_oversized_messages() {
        let (emitter, mut events) = TransportEventEmitter::new();
        let (transport, mut peer) = pair();
        let transport = transport
            .with_config(TransportConfig {
                limits: LimitsConfig {
                    max_inbound_size: Some(64),
                    max_outbound_size: Some(64),
                },
                timeouts: TimeoutConfig::default(),
            })
            .with_event_emitter(emitter);
        transport.connect().await.unwrap();

        let big = JsonRpcNotification::new("x", Some(json!({"pad": "y".repeat(100)})));
        let err = transport.notify(big).await.unwrap_err();
        assert!(matches!(err, TransportError::OutboundTooLarge { max: 64, .. }));

        let server = async {
            peer.read().await;
            let pad = "z".repeat(200);
            peer.write(&format!(r#"{{"method":"big","params":{{"pad":"{pad}"}}}}"#))
                .await;
            peer.write(r#"{"id":3,"result":1}"#).await;
        };
        let (response, ()) = tokio::join!(transport.send(request(3, "y")), server);
        assert!(response.unwrap().is_success());

        let mut saw_oversize = false;
        while let Ok(event) = events.try_recv() {
            if let TransportEvent::Error {
                error: TransportError::InboundTooLarge { max },
                ..
            } = event
            {
                assert_eq!(max, 64);
                saw_oversize = true;
            }
        }
        assert!(saw_oversize);
    }

    #[tokio::test]
    async fn test_oversized_lines_do_not_end_the_read_loop() {
        let (transport, mut peer) = pair();
        let transport = transport.with_config(TransportConfig {
            limits: LimitsConfig {
                max_inbound_size: Some(64),
                max_outbound_size: None,
            },
            timeouts: TimeoutConfig::default(),
        });
        transport.connect().await.unwrap();

        let server = async {
            peer.read().await;
            let pad = "q".repeat(300);
            for _ in 0..2 {
                peer.write(&format!(r#"{{"method":"noise","params":{{"pad":"{pad}"}}}}"#))
                    .await;
            }
            peer.write(r#"{"id":1,"result":"first"}"#).await;
        };
        let (first, ()) = tokio::join!(transport.send(request(1, "a")), server);
        assert_eq!(first.unwrap().result(), Some(&json!("first")));
        assert_eq!(transport.state().await, TransportState::Connected);

        let server = async {
            peer.read().await;
            peer.write(r#"{"id":2,"result":"second"}"#).await;
        };
        let (second, ()) = tokio::join!(transport.send(request(2, "b")), server);
        assert_eq!(second.unwrap().result(), Some(&json!("second")));

        let Peer { lines, writer } = peer;
        drop(writer);
        tokio::time::timeout(Duration::from_secs(1), transport.closed())
            .await
            .expect("EOF after the oversized lines still closes");
        drop(lines);
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_rejected() {
        let (transport, mut peer) = pair();
        transport.connect().await.unwrap();

        let first = transport.send(request(9, "a"));
        tokio::pin!(first);
        assert!(
            tokio::time::timeout(Duration::from_millis(10), &mut first)
                .await
                .is_err()
        );
        peer.read().await;

        let err = transport.send(request(9, "b")).await.unwrap_err();
        assert!(matches!(err, TransportError::ProtocolError(_)));

        peer.write(r#"{"id":9,"result":null}"#).await;
        assert!(first.await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let err = StdioTransport::spawn(Command::new("definitely-not-a-codex-binary-42"))
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed(_)), "{err}");
    }

    #[test]
    fn test_stream_source_debug() {
        assert_eq!(format!("{:?}", StreamSource::ProcessStdio), "ProcessStdio");
        assert_eq!(format!("{:?}", StreamSource::Consumed), "Consumed");
    }
}
