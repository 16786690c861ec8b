//! Pluggable wire codecs.
//!
//! A codec converts between [`Envelope`]s and transport frames. The active
//! codec is chosen once, before the connection starts; the connection manager
//! refuses to swap it while a connection is live.

pub mod json;

use std::sync::Arc;

use eddwise_core::error::EddError;

use crate::message::{Envelope, WireMessage};

pub use json::JsonCodec;

/// Encode/decode strategy for envelopes.
pub trait Codec: Send + Sync {
    /// Short identifier used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Encodes an outbound envelope into a transport frame.
    fn encode(&self, envelope: &Envelope) -> Result<WireMessage, EddError>;

    /// Decodes an inbound transport frame.
    ///
    /// Text and binary frames are both accepted; binary frames arrive already
    /// materialized as a byte buffer.
    fn decode(&self, raw: &WireMessage) -> Result<Envelope, EddError>;
}

/// Resolves a codec from its configured name.
pub fn codec_by_name(name: &str) -> Result<Arc<dyn Codec>, EddError> {
    match name {
        "json" => Ok(Arc::new(JsonCodec)),
        other => Err(EddError::configuration(format!("Unknown codec '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_by_name() {
        assert_eq!(codec_by_name("json").unwrap().name(), "json");
        assert!(codec_by_name("msgpack").is_err());
    }
}
