//! Wire envelope, reserved message vocabulary, and validation.

pub mod envelope;
pub mod types;
pub mod validator;
pub mod wire;

pub use envelope::{ERRORS_CHANNEL, Envelope};
pub use types::{AuthChallenge, AuthPass, BasicAuth, ReservedEvent, ReservedName, UserJoin, UserLeft};
pub use wire::WireMessage;
