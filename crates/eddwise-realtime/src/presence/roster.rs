//! Presence roster — online user ids with their join times.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::channel::EddChannel;

/// Tracks which users the server announced as present.
#[derive(Debug, Default)]
pub struct PresenceRoster {
    /// User ID → when the join was received
    online: DashMap<String, DateTime<Utc>>,
}

impl PresenceRoster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs this roster as the channel's `user_join` / `user_left`
    /// handlers, replacing any set before.
    pub fn attach(self: &Arc<Self>, channel: &EddChannel) {
        let roster = Arc::clone(self);
        channel.user_join(move |ch, join| {
            debug!(channel = %ch.alias(), user_id = %join.id, "User joined");
            roster.mark_joined(join.id);
        });

        let roster = Arc::clone(self);
        channel.user_left(move |ch, left| {
            debug!(channel = %ch.alias(), user_id = %left.id, "User left");
            roster.mark_left(&left.id);
        });
    }

    /// Record a user as online. A repeated join keeps the first join time.
    pub fn mark_joined(&self, user_id: impl Into<String>) {
        self.online.entry(user_id.into()).or_insert_with(Utc::now);
    }

    /// Record a user as gone. Returns `false` if the user was not online.
    pub fn mark_left(&self, user_id: &str) -> bool {
        self.online.remove(user_id).is_some()
    }

    /// Check if a user is online
    pub fn is_online(&self, user_id: &str) -> bool {
        self.online.contains_key(user_id)
    }

    /// When the user's join was received
    pub fn joined_at(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.online.get(user_id).map(|r| *r.value())
    }

    /// Online user ids, sorted
    pub fn online_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.online.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of online users
    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Forget everyone, e.g. after a disconnect
    pub fn clear(&self) {
        self.online.clear();
    }
}
