//! Out-of-band transport events.

use codex_rpc_protocol::RequestId;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::types::TransportType;

/// Represents events that occur within a transport's lifecycle.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The transport started carrying messages.
    Connected {
        /// The type of the transport that connected.
        transport_type: TransportType,
        /// The endpoint of the connection.
        endpoint: String,
    },

    /// The transport stopped carrying messages.
    Disconnected {
        /// The type of the transport that disconnected.
        transport_type: TransportType,
        /// The endpoint of the connection.
        endpoint: String,
        /// An optional reason for the disconnection.
        reason: Option<String>,
    },

    /// A message was written to the peer.
    MessageSent {
        /// Request or response id, absent for notifications.
        id: Option<RequestId>,
        /// Method name, absent for responses.
        method: Option<String>,
        /// The size of the framed line in bytes.
        size: usize,
    },

    /// A message was read from the peer.
    MessageReceived {
        /// Request or response id, absent for notifications.
        id: Option<RequestId>,
        /// Method name, absent for responses.
        method: Option<String>,
        /// The size of the line in bytes.
        size: usize,
    },

    /// Something went wrong that did not stop the transport, or did.
    Error {
        /// The error that occurred.
        error: TransportError,
        /// Optional additional context about the error.
        context: Option<String>,
    },
}

/// An emitter for broadcasting `TransportEvent`s to a listener.
#[derive(Debug, Clone)]
pub struct TransportEventEmitter {
    sender: mpsc::Sender<TransportEvent>,
}

impl TransportEventEmitter {
    /// Creates a new event emitter and a corresponding receiver.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<TransportEvent>) {
        let (sender, receiver) = mpsc::channel(500);
        (Self { sender }, receiver)
    }

    /// Emits an event, dropping it if the channel is full or nobody listens.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Emits a `Connected` event.
    pub fn emit_connected(&self, transport_type: TransportType, endpoint: String) {
        self.emit(TransportEvent::Connected {
            transport_type,
            endpoint,
        });
    }

    /// Emits a `Disconnected` event.
    pub fn emit_disconnected(
        &self,
        transport_type: TransportType,
        endpoint: String,
        reason: Option<String>,
    ) {
        self.emit(TransportEvent::Disconnected {
            transport_type,
            endpoint,
            reason,
        });
    }

    /// Emits a `MessageSent` event.
    pub fn emit_message_sent(&self, id: Option<RequestId>, method: Option<String>, size: usize) {
        self.emit(TransportEvent::MessageSent { id, method, size });
    }

    /// Emits a `MessageReceived` event.
    pub fn emit_message_received(
        &self,
        id: Option<RequestId>,
        method: Option<String>,
        size: usize,
    ) {
        self.emit(TransportEvent::MessageReceived { id, method, size });
    }

    /// Emits an `Error` event.
    pub fn emit_error(&self, error: TransportError, context: Option<String>) {
        self.emit(TransportEvent::Error { error, context });
    }
}

impl Default for TransportEventEmitter {
    fn default() -> Self {
        Self::new().0
    }
}
