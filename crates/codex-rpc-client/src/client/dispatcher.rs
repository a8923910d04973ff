//! Routing for both directions of the connection
//!
//! The dispatcher owns the client's shared state: the request id counter,
//! bookkeeping for requests in flight, notification listeners, and the
//! approval handler set. One `parking_lot` mutex guards all of it and is only
//! held while a map changes.
//!
//! Every listener owns an unbounded queue drained by its own task. Dispatch
//! only enqueues, so a listener sees its notifications in arrival order and a
//! slow one never holds up another. Listeners run without the lock held and
//! may call back into the dispatcher freely.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use codex_rpc_protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
};
use codex_rpc_transport_traits::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::handlers::{ApprovalHandlers, HandlerError};

/// A registered notification callback
pub(crate) type Listener = Arc<dyn Fn(&JsonRpcNotification) + Send + Sync>;

/// A request the client wrote and has not finished with.
#[derive(Debug)]
struct PendingRequest {
    method: String,
    started: Instant,
}

/// Where dispatch puts notifications for one registered listener
#[derive(Clone)]
struct ListenerSlot {
    id: u64,
    queue: mpsc::UnboundedSender<JsonRpcNotification>,
}

struct DispatcherState {
    next_id: i64,
    pending: HashMap<RequestId, PendingRequest>,
    listeners: HashMap<String, Vec<ListenerSlot>>,
    next_listener_id: u64,
    approvals: Arc<ApprovalHandlers>,
}

/// Shared routing state for one client
pub(crate) struct Dispatcher {
    state: Mutex<DispatcherState>,
    runtime: Handle,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Dispatcher")
            .field("next_id", &state.next_id)
            .field("pending", &state.pending.len())
            .field(
                "listeners",
                &state.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .field("approvals", &state.approvals.configured_methods())
            .finish()
    }
}

impl Dispatcher {
    /// Listener tasks are spawned onto `runtime`.
    pub(crate) fn new(approvals: ApprovalHandlers, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            state: Mutex::new(DispatcherState {
                next_id: 1,
                pending: HashMap::new(),
                listeners: HashMap::new(),
                next_listener_id: 1,
                approvals: Arc::new(approvals),
            }),
        })
    }

    /// Allocate a fresh id and record the request as in flight.
    ///
    /// The record is removed when the returned guard drops, whichever way the
    /// call ends.
    pub(crate) fn begin_request(&self, method: &str) -> PendingGuard<'_> {
        let mut state = self.state.lock();
        let id = RequestId::from(state.next_id);
        state.next_id += 1;
        state.pending.insert(
            id.clone(),
            PendingRequest {
                method: method.to_string(),
                started: Instant::now(),
            },
        );
        PendingGuard {
            dispatcher: self,
            id,
        }
    }

    /// Requests currently in flight
    pub(crate) fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Replace the whole approval handler set at once.
    pub(crate) fn set_approvals(&self, approvals: ApprovalHandlers) {
        debug!(methods = ?approvals.configured_methods(), "Approval handlers replaced");
        self.state.lock().approvals = Arc::new(approvals);
    }

    /// Register `listener` for every method in `methods`.
    ///
    /// All of them feed one queue, so the listener sees notifications across
    /// those methods in the order they arrived.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        methods: &[&str],
        listener: Listener,
    ) -> Subscription {
        let (queue, pending) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut state = self.state.lock();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            for method in methods {
                state
                    .listeners
                    .entry((*method).to_string())
                    .or_default()
                    .push(ListenerSlot {
                        id,
                        queue: queue.clone(),
                    });
            }
            id
        };
        self.runtime
            .spawn(run_listener(id, pending, listener, Arc::clone(&active)));
        trace!(?methods, listener = id, "notification listener registered");
        Subscription {
            dispatcher: Arc::downgrade(self),
            methods: methods.iter().map(|m| (*m).to_string()).collect(),
            id,
            active,
        }
    }

    fn unsubscribe(&self, methods: &[String], id: u64) {
        let mut state = self.state.lock();
        for method in methods {
            if let Some(listeners) = state.listeners.get_mut(method) {
                listeners.retain(|slot| slot.id != id);
                if listeners.is_empty() {
                    state.listeners.remove(method);
                }
            }
        }
    }

    /// Queue the notification for every listener registered for its method.
    ///
    /// Never blocks on a listener.
    pub(crate) fn dispatch_notification(&self, notification: &JsonRpcNotification) {
        let state = self.state.lock();
        let Some(listeners) = state.listeners.get(&notification.method) else {
            trace!(method = %notification.method, "no listener for notification");
            return;
        };
        for slot in listeners {
            if slot.queue.send(notification.clone()).is_err() {
                trace!(method = %notification.method, listener = slot.id, "listener task is gone");
            }
        }
    }

    /// Answer a request the server sent.
    ///
    /// The handler set is read once, so a concurrent replacement is seen
    /// either entirely or not at all.
    pub(crate) fn handle_request(
        &self,
        request: JsonRpcRequest,
    ) -> BoxFuture<'static, JsonRpcResponse> {
        let approvals = Arc::clone(&self.state.lock().approvals);
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let Some(handler) = approvals.route(&method, params) else {
            debug!(%method, %id, "no handler for server request");
            let response = JsonRpcResponse::error(id, JsonRpcError::method_not_found(&method));
            return Box::pin(std::future::ready(response));
        };

        Box::pin(async move {
            let outcome = match AssertUnwindSafe(handler).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(HandlerError::Panicked {
                    message: panic_message(panic.as_ref()),
                }),
            };
            match outcome {
                Ok(result) => {
                    trace!(%method, %id, "server request handled");
                    JsonRpcResponse::success(id, result)
                }
                Err(e) => {
                    warn!(%method, %id, error = %e, "approval handler failed");
                    JsonRpcResponse::error(id, e.into_jsonrpc_error())
                }
            }
        })
    }
}

/// Removes a request's record when the call finishes.
pub(crate) struct PendingGuard<'a> {
    dispatcher: &'a Dispatcher,
    id: RequestId,
}

impl PendingGuard<'_> {
    pub(crate) fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(request) = self.dispatcher.state.lock().pending.remove(&self.id) {
            trace!(
                id = %self.id,
                method = %request.method,
                elapsed_ms = request.started.elapsed().as_millis() as u64,
                "request finished"
            );
        }
    }
}

/// Handle for one notification listener.
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    dispatcher: Weak<Dispatcher>,
    methods: Vec<String>,
    id: u64,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Remove the listener. Later calls do nothing.
    ///
    /// Safe to call from inside any listener, including this one.
    /// Notifications already queued for the listener are dropped.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.unsubscribe(&self.methods, self.id);
            trace!(methods = ?self.methods, listener = self.id, "notification listener removed");
        }
    }

    /// `false` once [`unsubscribe`](Self::unsubscribe) has run
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The notification methods this listener receives
    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("methods", &self.methods)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Deliver queued notifications to one listener until it is removed.
///
/// A listener that panics is logged and keeps receiving.
async fn run_listener(
    id: u64,
    mut pending: mpsc::UnboundedReceiver<JsonRpcNotification>,
    listener: Listener,
    active: Arc<AtomicBool>,
) {
    while let Some(notification) = pending.recv().await {
        if !active.load(Ordering::Acquire) {
            break;
        }
        if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| listener(&notification)))
        {
            warn!(
                method = %notification.method,
                listener = id,
                panic = %panic_message(panic.as_ref()),
                "notification listener panicked"
            );
        }
    }
    trace!(listener = id, "notification listener stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
