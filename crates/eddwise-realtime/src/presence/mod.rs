//! Presence — who is online on a channel, fed by `edd:user:join` / `edd:user:left`.

pub mod roster;

pub use roster::PresenceRoster;
