//! JSON codec, the default.

use eddwise_core::error::EddError;

use super::Codec;
use crate::message::{Envelope, WireMessage};

/// Encodes envelopes as JSON text frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, envelope: &Envelope) -> Result<WireMessage, EddError> {
        Ok(WireMessage::Text(serde_json::to_string(envelope)?))
    }

    fn decode(&self, raw: &WireMessage) -> Result<Envelope, EddError> {
        serde_json::from_slice(raw.as_bytes())
            .map_err(|e| EddError::serialization(format!("Failed to decode envelope: {e}")))
    }
}
