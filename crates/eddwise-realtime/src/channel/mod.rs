//! Channels — the application-defined handlers of one alias each.

pub mod channel;
pub mod registry;

pub use channel::{Channel, EddChannel};
pub use registry::ChannelRegistry;
