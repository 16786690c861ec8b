//! Reserved message vocabulary shared by every channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use eddwise_core::error::EddError;

/// Server asks the client to authenticate with one of `methods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    /// Accepted authentication methods, e.g. `edd:auth:basic`.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Server accepted the credentials and assigned an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPass {
    /// Authenticated user id.
    pub id: String,
}

/// Username/password credentials sent in reply to a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// A user became present on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserJoin {
    /// User id.
    pub id: String,
}

/// A user is no longer present on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLeft {
    /// User id.
    pub id: String,
}

/// Names of the reserved messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedName {
    /// `edd:auth:challenge` (inbound).
    AuthChallenge,
    /// `edd:auth:pass` (inbound).
    AuthPass,
    /// `edd:auth:basic` (outbound).
    AuthBasic,
    /// `edd:user:join` (inbound).
    UserJoin,
    /// `edd:user:left` (inbound).
    UserLeft,
}

impl ReservedName {
    /// Wire name of the message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthChallenge => "edd:auth:challenge",
            Self::AuthPass => "edd:auth:pass",
            Self::AuthBasic => "edd:auth:basic",
            Self::UserJoin => "edd:user:join",
            Self::UserLeft => "edd:user:left",
        }
    }

    /// Parses a wire name. Returns `None` for names outside the reserved set.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "edd:auth:challenge" => Some(Self::AuthChallenge),
            "edd:auth:pass" => Some(Self::AuthPass),
            "edd:auth:basic" => Some(Self::AuthBasic),
            "edd:user:join" => Some(Self::UserJoin),
            "edd:user:left" => Some(Self::UserLeft),
            _ => None,
        }
    }
}

impl fmt::Display for ReservedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound reserved message with its typed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservedEvent {
    /// `edd:auth:challenge`
    AuthChallenge(AuthChallenge),
    /// `edd:auth:pass`
    AuthPass(AuthPass),
    /// `edd:user:join`
    UserJoin(UserJoin),
    /// `edd:user:left`
    UserLeft(UserLeft),
}

impl ReservedEvent {
    /// Decodes an inbound message into a reserved event.
    ///
    /// Returns `Ok(None)` when `name` is not an inbound reserved name; the
    /// caller decides what to do with it. A recognised name with a body of the
    /// wrong shape is an error.
    pub fn decode(name: &str, body: Value) -> Result<Option<Self>, EddError> {
        let Some(reserved) = ReservedName::parse(name) else {
            return Ok(None);
        };

        let event = match reserved {
            ReservedName::AuthChallenge => Self::AuthChallenge(decode_body(reserved, body)?),
            ReservedName::AuthPass => Self::AuthPass(decode_body(reserved, body)?),
            ReservedName::UserJoin => Self::UserJoin(decode_body(reserved, body)?),
            ReservedName::UserLeft => Self::UserLeft(decode_body(reserved, body)?),
            ReservedName::AuthBasic => return Ok(None),
        };
        Ok(Some(event))
    }

    /// The reserved name this event was decoded from.
    pub fn name(&self) -> ReservedName {
        match self {
            Self::AuthChallenge(_) => ReservedName::AuthChallenge,
            Self::AuthPass(_) => ReservedName::AuthPass,
            Self::UserJoin(_) => ReservedName::UserJoin,
            Self::UserLeft(_) => ReservedName::UserLeft,
        }
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(
    name: ReservedName,
    body: Value,
) -> Result<T, EddError> {
    serde_json::from_value(body)
        .map_err(|e| EddError::serialization(format!("malformed body for '{name}': {e}")))
}
