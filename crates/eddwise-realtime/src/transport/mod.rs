//! Transport boundary.
//!
//! A [`Transport`] dials one physical connection per [`Transport::open`] call
//! and reports what happens to it through the [`EventSink`] it was given:
//! exactly the four signals of [`TransportEvent`]. The returned
//! [`TransportLink`] is the write half used by the connection manager.
//!
//! Events emitted through a sink that belongs to a superseded connection are
//! dropped, so a transport never has to coordinate with restarts.

pub mod websocket;

use std::sync::Weak;

use eddwise_core::error::EddError;

use crate::connection::manager::ClientInner;
use crate::message::WireMessage;

pub use websocket::WebSocketTransport;

/// A signal raised by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Open,
    /// A frame arrived.
    Message(WireMessage),
    /// The connection is gone.
    Close,
    /// The connection failed; a `Close` normally follows.
    Error(TransportFault),
}

/// Details attached to a transport error signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportFault {
    /// RFC 6455 close code, when one applies.
    pub code: Option<u16>,
    /// Free-form detail supplied by the peer or the socket library.
    pub reason: String,
}

impl TransportFault {
    /// Create a fault with a close code.
    pub fn new(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Dials physical connections.
pub trait Transport: Send + Sync {
    /// Starts connecting to `address`.
    ///
    /// Returning `Err` means the dial could not even begin (bad address, no
    /// runtime). Otherwise the outcome is reported asynchronously through
    /// `events`. The manager's connection lock is held for the duration of
    /// the call: emitting from the calling thread deadlocks, and events
    /// emitted from other threads are processed only after `open` returns.
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn TransportLink>, EddError>;
}

/// Write half of one physical connection.
pub trait TransportLink: Send + Sync {
    /// Writes one frame. Fire-and-forget.
    fn send(&self, message: WireMessage) -> Result<(), EddError>;

    /// Closes the connection.
    fn close(&self);
}

/// Delivers transport signals to the connection manager that opened the link.
#[derive(Clone)]
pub struct EventSink {
    client: Weak<ClientInner>,
    generation: u64,
}

impl EventSink {
    pub(crate) fn new(client: Weak<ClientInner>, generation: u64) -> Self {
        Self { client, generation }
    }

    /// Delivers `event` synchronously.
    ///
    /// Returns `false` if the manager is gone or has moved on to another
    /// connection, in which case the event is discarded.
    pub fn emit(&self, event: TransportEvent) -> bool {
        match self.client.upgrade() {
            Some(client) => client.handle_event(self.generation, event),
            None => false,
        }
    }

    /// Returns `true` while this sink still belongs to the live connection.
    pub fn is_current(&self) -> bool {
        self.client
            .upgrade()
            .is_some_and(|client| client.is_current(self.generation))
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish()
    }
}
