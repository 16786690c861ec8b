//! # eddwise-realtime
//!
//! Client-side multiplexing over a single WebSocket connection. Provides:
//!
//! - A connection manager ([`EddClient`]) driving the connect/disconnect
//!   lifecycle with a connect timeout
//! - A channel registry that demultiplexes inbound envelopes by alias
//! - A base channel ([`EddChannel`]) understanding the reserved auth and
//!   presence vocabulary
//! - A pluggable wire codec (JSON by default)
//! - A `tokio-tungstenite` transport and a transport trait for fakes
//! - A presence roster fed by `edd:user:join` / `edd:user:left`

pub mod channel;
pub mod codec;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod transport;

mod lock;

pub use channel::{Channel, ChannelRegistry, EddChannel};
pub use codec::{Codec, JsonCodec};
pub use connection::handle::{ClientRef, ConnectionInfo};
pub use connection::manager::{EddClient, ErrorHandler};
pub use connection::state::ConnectionState;
pub use message::{Envelope, WireMessage};
pub use presence::PresenceRoster;
pub use transport::{EventSink, Transport, TransportEvent, TransportFault, TransportLink};
