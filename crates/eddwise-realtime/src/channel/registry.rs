//! Channel registry — alias to channel, in registration order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use eddwise_core::error::EddError;

use super::channel::Channel;

struct RegisteredChannel {
    seq: u64,
    channel: Arc<dyn Channel>,
}

/// Registry of the channels bound to one client.
///
/// Aliases are unique; registering a second channel under a taken alias is
/// rejected.
pub struct ChannelRegistry {
    /// Alias → channel.
    channels: DashMap<String, RegisteredChannel>,
    /// Registration counter, used to keep notification order stable.
    next_seq: AtomicU64,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Adds a channel under its alias.
    pub fn register(&self, channel: Arc<dyn Channel>) -> Result<(), EddError> {
        match self.channels.entry(channel.alias().to_string()) {
            Entry::Occupied(entry) => Err(EddError::conflict(format!(
                "channel '{}' is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(RegisteredChannel { seq, channel });
                Ok(())
            }
        }
    }

    /// Looks up a channel by alias.
    pub fn get(&self, alias: &str) -> Option<Arc<dyn Channel>> {
        self.channels.get(alias).map(|entry| entry.channel.clone())
    }

    /// Returns `true` if `alias` is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.channels.contains_key(alias)
    }

    /// All channels in registration order.
    ///
    /// The returned list is detached from the registry, so callers may invoke
    /// channel callbacks while iterating.
    pub fn snapshot(&self) -> Vec<Arc<dyn Channel>> {
        let mut entries: Vec<(u64, Arc<dyn Channel>)> = self
            .channels
            .iter()
            .map(|entry| (entry.seq, entry.channel.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, channel)| channel).collect()
    }

    /// Aliases in registration order.
    pub fn aliases(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|channel| channel.alias().to_string())
            .collect()
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("aliases", &self.aliases())
            .finish()
    }
}
