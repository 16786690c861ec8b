//! Connection manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a single multiplexed connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket address to dial, e.g. `ws://127.0.0.1:3000/chat`.
    #[serde(default = "default_address")]
    pub address: String,
    /// Time allowed for the transport to report it is open, in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Wire codec name. Only `"json"` ships with the client.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Largest inbound payload accepted before decode, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl ClientConfig {
    /// Returns the connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Creates a configuration for `address` with every other field defaulted.
    pub fn for_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout_ms: default_connect_timeout(),
            codec: default_codec(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_address() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_codec() -> String {
    "json".to_string()
}

fn default_max_message_size() -> usize {
    65_536
}
