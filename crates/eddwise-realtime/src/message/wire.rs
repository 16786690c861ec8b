//! Raw payloads as carried by the transport.

use bytes::Bytes;

/// One transport frame, before decode or after encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// A text frame.
    Text(String),
    /// A binary frame, already materialized into a byte buffer.
    Binary(Bytes),
}

impl WireMessage {
    /// Returns the payload bytes regardless of frame type.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for binary frames.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

impl From<String> for WireMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for WireMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for WireMessage {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(data))
    }
}

impl From<Bytes> for WireMessage {
    fn from(data: Bytes) -> Self {
        Self::Binary(data)
    }
}
