//! Convenience result type alias for the eddwise client.

use crate::error::EddError;

/// A specialized `Result` type for eddwise operations.
pub type EddResult<T> = Result<T, EddError>;
