//! Non-owning client handle given to channels, and connection snapshots.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use eddwise_core::error::EddError;

use super::manager::{ClientInner, EddClient};
use super::state::ConnectionState;
use crate::message::{Envelope, WireMessage};

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Back-reference from a channel to the client that owns it.
///
/// The reference is weak: channels never keep the client alive, they only
/// use it to send and to report errors.
#[derive(Clone)]
pub struct ClientRef {
    inner: Weak<ClientInner>,
}

impl ClientRef {
    pub(crate) fn new(inner: &Arc<ClientInner>) -> Self {
        Self {
            inner: Arc::downgrade(inner),
        }
    }

    /// Upgrades to a full client handle if the client is still alive.
    pub fn upgrade(&self) -> Option<EddClient> {
        self.inner.upgrade().map(EddClient::from_inner)
    }

    /// Returns `true` while the client is alive.
    pub fn is_live(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Encodes and sends an envelope. See [`EddClient::send`].
    pub fn send(&self, envelope: &Envelope) -> bool {
        match self.upgrade() {
            Some(client) => client.send(envelope),
            None => {
                warn!(channel = %envelope.channel, name = %envelope.name, "Send on a dropped client");
                false
            }
        }
    }

    /// Sends a pre-encoded frame. See [`EddClient::send_raw`].
    pub fn send_raw(&self, raw: WireMessage) -> bool {
        match self.upgrade() {
            Some(client) => client.send_raw(raw),
            None => {
                warn!("Raw send on a dropped client");
                false
            }
        }
    }

    /// Forwards an error to the client's error callback.
    pub fn report(&self, err: EddError) {
        match self.inner.upgrade() {
            Some(inner) => inner.report(err),
            None => tracing::error!(kind = %err.kind, "{}", err.message),
        }
    }

    /// Current connection state, or `None` if the client is gone.
    pub fn state(&self) -> Option<ConnectionState> {
        self.upgrade().map(|client| client.state())
    }
}

impl std::fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRef")
            .field("live", &self.is_live())
            .finish()
    }
}

/// Snapshot of the current connection (serializable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Identifier of this connection attempt
    pub id: ConnectionId,
    /// Dialed address
    pub address: String,
    /// Lifecycle state at snapshot time
    pub state: ConnectionState,
    /// When `start` was called
    pub started_at: DateTime<Utc>,
    /// When the transport reported open
    pub connected_at: Option<DateTime<Utc>>,
    /// Active codec
    pub codec: String,
}
