//! Message validation rules.

use eddwise_core::error::EddError;

use super::envelope::ERRORS_CHANNEL;
use super::wire::WireMessage;

/// Maximum length of a channel alias.
pub const MAX_ALIAS_LENGTH: usize = 256;

/// Validates a raw inbound payload before it is decoded.
pub fn validate_inbound(raw: &WireMessage, max_size: usize) -> Result<(), EddError> {
    if raw.len() > max_size {
        return Err(EddError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.as_bytes().iter().all(u8::is_ascii_whitespace) {
        return Err(EddError::validation("Empty message"));
    }

    Ok(())
}

/// Validates a channel alias before registration.
pub fn validate_alias(alias: &str) -> Result<(), EddError> {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LENGTH {
        return Err(EddError::validation("Invalid channel alias length"));
    }

    if alias == ERRORS_CHANNEL {
        return Err(EddError::validation(format!(
            "Channel alias '{ERRORS_CHANNEL}' is reserved"
        )));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_')
    {
        return Err(EddError::validation(
            "Channel alias contains invalid characters",
        ));
    }

    Ok(())
}
