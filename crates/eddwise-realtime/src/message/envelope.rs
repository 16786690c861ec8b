//! The decoded unit of wire exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use eddwise_core::error::EddError;

/// Channel name reserved for application-level errors sent by the peer.
pub const ERRORS_CHANNEL: &str = "errors";

/// A message addressed to one channel.
///
/// Every inbound message is exactly one envelope after codec decode, and
/// every outbound message is exactly one envelope before codec encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Alias of the target channel, or [`ERRORS_CHANNEL`].
    pub channel: String,
    /// Message type within the channel.
    pub name: String,
    /// Payload whose shape is defined by `name`.
    #[serde(default)]
    pub body: Value,
}

impl Envelope {
    /// Create an envelope from an already-built body.
    pub fn new(channel: impl Into<String>, name: impl Into<String>, body: Value) -> Self {
        Self {
            channel: channel.into(),
            name: name.into(),
            body,
        }
    }

    /// Create an envelope by serializing `body`.
    pub fn with_body<T: Serialize>(
        channel: impl Into<String>,
        name: impl Into<String>,
        body: &T,
    ) -> Result<Self, EddError> {
        Ok(Self::new(channel, name, serde_json::to_value(body)?))
    }

    /// Returns `true` if the envelope travels on the reserved errors channel.
    pub fn is_error(&self) -> bool {
        self.channel == ERRORS_CHANNEL
    }
}
