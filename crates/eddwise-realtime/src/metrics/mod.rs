//! Client metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Client-level counters.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Frames written to the transport
    pub messages_sent: AtomicU64,
    /// Frames received from the transport
    pub messages_received: AtomicU64,
    /// Errors delivered to the error callback
    pub errors_reported: AtomicU64,
    /// Connections that reached the connected state
    pub connections_opened: AtomicU64,
    /// Established connections that were closed or stopped
    pub connections_closed: AtomicU64,
}

impl ClientMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn error_reported(&self) {
        self.errors_reported.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            errors_reported: self.errors_reported.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Frames written
    pub messages_sent: u64,
    /// Frames received
    pub messages_received: u64,
    /// Errors reported
    pub errors_reported: u64,
    /// Connections opened
    pub connections_opened: u64,
    /// Connections closed
    pub connections_closed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = ClientMetrics::new();
        metrics.message_sent();
        metrics.message_sent();
        metrics.message_received();
        metrics.error_reported();
        metrics.connection_opened();

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.messages_received, 1);
        assert_eq!(snap.errors_reported, 1);
        assert_eq!(snap.connections_opened, 1);
        assert_eq!(snap.connections_closed, 0);
    }
}
