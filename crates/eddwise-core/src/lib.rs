//! # eddwise-core
//!
//! Core crate for the eddwise client. Contains configuration schemas and the
//! unified error system shared by the realtime engine and the binary.
//!
//! This crate has **no** internal dependencies on other eddwise crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{EddError, ErrorKind};
pub use result::EddResult;
