//! Channel contract and the base channel understanding the reserved vocabulary.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use eddwise_core::error::EddError;

use crate::connection::handle::ClientRef;
use crate::lock;
use crate::message::{
    AuthChallenge, AuthPass, BasicAuth, Envelope, ReservedEvent, ReservedName, UserJoin, UserLeft,
};

/// A logical topic multiplexed over the client's connection.
///
/// Application channels usually wrap an [`EddChannel`] and delegate `route`
/// to it for names they do not own themselves.
pub trait Channel: Send + Sync {
    /// Registry key and `channel` field of outbound envelopes.
    fn alias(&self) -> &str;

    /// Binds the owning client. Called on registration and again on every
    /// `start`.
    fn set_client(&self, client: ClientRef);

    /// Handles one inbound message. Returns `false` if `name` is not
    /// recognised.
    fn route(&self, name: &str, body: Value) -> bool;

    /// Called once the connection is open.
    fn connected(&self) {}

    /// Called once an established connection is gone.
    fn disconnected(&self) {}
}

type LifecycleHandler = Arc<dyn Fn(&EddChannel) + Send + Sync>;
type EventHandler<T> = Arc<dyn Fn(&EddChannel, T) + Send + Sync>;

#[derive(Clone, Default)]
struct Handlers {
    connected: Option<LifecycleHandler>,
    disconnected: Option<LifecycleHandler>,
    auth_challenged: Option<EventHandler<AuthChallenge>>,
    auth_passed: Option<EventHandler<AuthPass>>,
    user_join: Option<EventHandler<UserJoin>>,
    user_left: Option<EventHandler<UserLeft>>,
}

/// Base channel: routes the reserved auth and presence messages to
/// application-supplied handlers.
///
/// Handlers receive the channel itself, so they can reply (for instance with
/// [`EddChannel::send_auth_basic`]) without capturing it.
pub struct EddChannel {
    alias: String,
    client: RwLock<Option<ClientRef>>,
    handlers: RwLock<Handlers>,
}

impl EddChannel {
    /// Creates an unbound channel.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            client: RwLock::new(None),
            handlers: RwLock::new(Handlers::default()),
        }
    }

    /// Channel alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The client this channel is bound to, if any.
    pub fn client(&self) -> Option<ClientRef> {
        lock::read(&self.client).clone()
    }

    /// Returns `true` once the channel has been registered with a live client.
    pub fn is_bound(&self) -> bool {
        self.client().is_some_and(|client| client.is_live())
    }

    pub fn on_connected<F>(&self, handler: F)
    where
        F: Fn(&EddChannel) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).connected = Some(Arc::new(handler));
    }

    pub fn on_disconnected<F>(&self, handler: F)
    where
        F: Fn(&EddChannel) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).disconnected = Some(Arc::new(handler));
    }

    /// Sets the `edd:auth:challenge` handler.
    pub fn auth_challenged<F>(&self, handler: F)
    where
        F: Fn(&EddChannel, AuthChallenge) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).auth_challenged = Some(Arc::new(handler));
    }

    /// Sets the `edd:auth:pass` handler.
    pub fn auth_passed<F>(&self, handler: F)
    where
        F: Fn(&EddChannel, AuthPass) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).auth_passed = Some(Arc::new(handler));
    }

    /// Sets the `edd:user:join` handler.
    pub fn user_join<F>(&self, handler: F)
    where
        F: Fn(&EddChannel, UserJoin) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).user_join = Some(Arc::new(handler));
    }

    /// Sets the `edd:user:left` handler.
    pub fn user_left<F>(&self, handler: F)
    where
        F: Fn(&EddChannel, UserLeft) + Send + Sync + 'static,
    {
        lock::write(&self.handlers).user_left = Some(Arc::new(handler));
    }

    /// Answers an auth challenge with username/password credentials.
    pub fn send_auth_basic(&self, username: impl Into<String>, password: impl Into<String>) -> bool {
        let credentials = BasicAuth {
            username: username.into(),
            password: password.into(),
        };
        self.send(ReservedName::AuthBasic.as_str(), &credentials)
    }

    /// Sends `body` under `name` on this channel.
    ///
    /// Returns `false` if the channel is not bound, the body cannot be
    /// serialized, or the client refuses the send.
    pub fn send<T: Serialize>(&self, name: &str, body: &T) -> bool {
        let Some(client) = self.client() else {
            warn!(channel = %self.alias, name = %name, "Send on a channel that is not registered");
            return false;
        };

        match Envelope::with_body(self.alias.clone(), name, body) {
            Ok(envelope) => client.send(&envelope),
            Err(err) => {
                client.report(err);
                false
            }
        }
    }

    /// Forwards an error to the owning client's error callback.
    pub fn report(&self, err: EddError) {
        match self.client() {
            Some(client) => client.report(err),
            None => tracing::error!(channel = %self.alias, kind = %err.kind, "{}", err.message),
        }
    }

    fn handlers(&self) -> Handlers {
        lock::read(&self.handlers).clone()
    }

    fn dispatch(&self, event: ReservedEvent) {
        let handlers = self.handlers();
        match event {
            ReservedEvent::AuthChallenge(challenge) => match handlers.auth_challenged {
                Some(handler) => handler(self, challenge),
                None => info!(
                    channel = %self.alias,
                    "edd auth challenge was received from server, but no handler was configured"
                ),
            },
            ReservedEvent::AuthPass(pass) => match handlers.auth_passed {
                Some(handler) => handler(self, pass),
                None => info!(
                    channel = %self.alias,
                    "edd auth pass was received from server, but no handler was configured"
                ),
            },
            ReservedEvent::UserJoin(join) => match handlers.user_join {
                Some(handler) => handler(self, join),
                None => info!(
                    channel = %self.alias,
                    "edd user join was received from server, but no handler was configured"
                ),
            },
            ReservedEvent::UserLeft(left) => match handlers.user_left {
                Some(handler) => handler(self, left),
                None => info!(
                    channel = %self.alias,
                    "edd user left was received from server, but no handler was configured"
                ),
            },
        }
    }
}

impl Channel for EddChannel {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn set_client(&self, client: ClientRef) {
        *lock::write(&self.client) = Some(client);
    }

    fn route(&self, name: &str, body: Value) -> bool {
        match ReservedEvent::decode(name, body) {
            Ok(Some(event)) => {
                debug!(channel = %self.alias, name = %name, "Reserved message");
                self.dispatch(event);
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.report(err);
                true
            }
        }
    }

    fn connected(&self) {
        if let Some(handler) = self.handlers().connected {
            handler(self);
        }
    }

    fn disconnected(&self) {
        if let Some(handler) = self.handlers().disconnected {
            handler(self);
        }
    }
}

impl std::fmt::Debug for EddChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EddChannel")
            .field("alias", &self.alias)
            .field("bound", &self.is_bound())
            .finish()
    }
}
