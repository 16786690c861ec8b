//! Unified error types for the eddwise client.
//!
//! Every failure the client detects is expressed as an [`EddError`] and handed
//! to the application's error callback, so errors carry enough context to be
//! logged or inspected without a backtrace.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Error kind categorization used across the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Dialing the remote endpoint failed or did not complete in time.
    Connect,
    /// The underlying socket reported a failure.
    Transport,
    /// The remote peer sent a message on the reserved `errors` channel.
    Remote,
    /// An inbound message named a channel that is not registered.
    UnknownChannel,
    /// A send was attempted while the connection was not established.
    InactiveConnection,
    /// Encoding or decoding a message failed.
    Serialization,
    /// A registration or configuration change conflicts with current state.
    Conflict,
    /// An application callback panicked.
    Callback,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "CONNECT"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Remote => write!(f, "REMOTE"),
            Self::UnknownChannel => write!(f, "UNKNOWN_CHANNEL"),
            Self::InactiveConnection => write!(f, "INACTIVE_CONNECTION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Callback => write!(f, "CALLBACK"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// The error value delivered to error callbacks and returned from fallible calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct EddError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Structured payload attached to the error, e.g. the body of a remote error.
    pub payload: Option<Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EddError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            payload: None,
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            payload: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a connect error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connect, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create an error from a body received on the `errors` channel.
    ///
    /// String bodies become the message as-is; any other body is rendered as
    /// JSON. The body itself is kept untouched in [`EddError::payload`].
    pub fn remote(body: Value) -> Self {
        let message = match &body {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            kind: ErrorKind::Remote,
            message,
            payload: Some(body),
            source: None,
        }
    }

    /// Create an unknown-channel error.
    pub fn unknown_channel(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownChannel, message)
    }

    /// Create an inactive-connection error.
    pub fn inactive_connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InactiveConnection, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a callback error.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Callback, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Returns `true` if the error came from the remote `errors` channel.
    pub fn is_remote(&self) -> bool {
        self.kind == ErrorKind::Remote
    }
}

impl Clone for EddError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            payload: self.payload.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for EddError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for EddError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Transport, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for EddError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
