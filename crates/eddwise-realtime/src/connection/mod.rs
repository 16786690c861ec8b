//! Connection lifecycle — manager, channel back-references, and states.

pub mod close_code;
pub mod handle;
pub mod manager;
pub mod state;
