//! Connection manager — owns the physical connection, drives its lifecycle,
//! and demultiplexes inbound envelopes to registered channels.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use eddwise_core::config::client::ClientConfig;
use eddwise_core::error::EddError;
use eddwise_core::result::EddResult;

use crate::channel::{Channel, ChannelRegistry};
use crate::codec::{Codec, JsonCodec, codec_by_name};
use crate::lock;
use crate::message::{Envelope, WireMessage, validator};
use crate::metrics::{ClientMetrics, MetricsSnapshot};
use crate::transport::{
    EventSink, Transport, TransportEvent, TransportFault, TransportLink, WebSocketTransport,
};

use super::close_code;
use super::handle::{ClientRef, ConnectionInfo};
use super::state::ConnectionState;

/// Application error callback.
pub type ErrorHandler = Arc<dyn Fn(EddError) + Send + Sync>;

const INACTIVE_CONNECTION: &str = "attempting to send message on inactive connection";

/// Multiplexing client over one physical connection.
///
/// Cloning is cheap; all clones drive the same connection.
#[derive(Clone)]
pub struct EddClient {
    inner: Arc<ClientInner>,
}

/// Shared state behind every [`EddClient`] clone.
///
/// Locks are only held for short state transitions and are always released
/// before channel or error callbacks run, so callbacks may call back into the
/// client freely.
pub(crate) struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    codec: RwLock<Arc<dyn Codec>>,
    channels: ChannelRegistry,
    slot: Mutex<ConnectionSlot>,
    on_error: RwLock<Option<ErrorHandler>>,
    metrics: ClientMetrics,
}

/// The one live transport instance and its lifecycle.
#[derive(Default)]
struct ConnectionSlot {
    state: ConnectionState,
    /// Bumped whenever a transport instance is superseded; events carrying
    /// an older generation are dropped.
    generation: u64,
    link: Option<Box<dyn TransportLink>>,
    timer: Option<AbortHandle>,
    info: Option<ConnectionInfo>,
}

impl ConnectionSlot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Connected,
    Disconnected,
}

impl Lifecycle {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl EddClient {
    /// Creates a client for `address` using the WebSocket transport and the
    /// JSON codec.
    pub fn new(address: impl Into<String>) -> Self {
        Self::build(
            ClientConfig::for_address(address),
            Arc::new(WebSocketTransport::new()),
            Arc::new(JsonCodec),
        )
    }

    /// Creates a client from configuration using the WebSocket transport.
    pub fn from_config(config: ClientConfig) -> EddResult<Self> {
        Self::with_transport(config, Arc::new(WebSocketTransport::new()))
    }

    /// Creates a client from configuration with a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> EddResult<Self> {
        let codec = codec_by_name(&config.codec)?;
        Ok(Self::build(config, transport, codec))
    }

    fn build(config: ClientConfig, transport: Arc<dyn Transport>, codec: Arc<dyn Codec>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                codec: RwLock::new(codec),
                channels: ChannelRegistry::new(),
                slot: Mutex::new(ConnectionSlot::default()),
                on_error: RwLock::new(None),
                metrics: ClientMetrics::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Returns a non-owning reference suitable for storing in channels.
    pub fn client_ref(&self) -> ClientRef {
        ClientRef::new(&self.inner)
    }

    /// Target address.
    pub fn address(&self) -> &str {
        &self.inner.config.address
    }

    /// Replaces the wire codec.
    ///
    /// Only allowed while no connection is pending or established.
    pub fn set_codec(&self, codec: Arc<dyn Codec>) -> EddResult<()> {
        let slot = lock::lock(&self.inner.slot);
        if slot.state.is_active() {
            return Err(EddError::conflict(format!(
                "codec cannot be changed while the connection is {}; stop the client first",
                slot.state
            )));
        }
        debug!(codec = codec.name(), "Codec configured");
        *lock::write(&self.inner.codec) = codec;
        Ok(())
    }

    /// Installs the error callback. Every failure the client detects is
    /// delivered here; without one, errors are logged.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(EddError) + Send + Sync + 'static,
    {
        *lock::write(&self.inner.on_error) = Some(Arc::new(handler));
    }

    /// Registers a channel under its alias.
    ///
    /// The channel is bound to this client immediately, so it can send even
    /// when registered after `start`. A second channel with an alias that is
    /// already registered is rejected.
    pub fn register(&self, channel: Arc<dyn Channel>) -> EddResult<()> {
        validator::validate_alias(channel.alias())?;
        self.inner.channels.register(channel.clone())?;
        channel.set_client(self.client_ref());
        debug!(channel = %channel.alias(), "Channel registered");
        Ok(())
    }

    /// Looks up a registered channel.
    pub fn channel(&self, alias: &str) -> Option<Arc<dyn Channel>> {
        self.inner.channels.get(alias)
    }

    /// Aliases of all registered channels, in registration order.
    pub fn channel_aliases(&self) -> Vec<String> {
        self.inner.channels.aliases()
    }

    /// Starts connecting with the configured connect timeout.
    pub fn start(&self) {
        self.start_with_timeout(self.inner.config.connect_timeout());
    }

    /// Starts connecting, failing with `"ws connection timeout"` if the
    /// transport has not opened within `timeout`.
    ///
    /// No-op while a connection is pending or established. There is no
    /// automatic retry; call `start` again after a failure.
    pub fn start_with_timeout(&self, timeout: Duration) {
        let inner = &self.inner;
        let (generation, stale) = {
            let mut slot = lock::lock(&inner.slot);
            if slot.state.is_active() {
                debug!(state = %slot.state, "Start ignored, connection already active");
                return;
            }
            slot.generation += 1;
            slot.state = ConnectionState::Connecting;
            slot.cancel_timer();
            slot.info = Some(ConnectionInfo {
                id: Uuid::new_v4(),
                address: inner.config.address.clone(),
                state: ConnectionState::Connecting,
                started_at: Utc::now(),
                connected_at: None,
                codec: inner.codec().name().to_string(),
            });
            (slot.generation, slot.link.take())
        };

        if let Some(link) = stale {
            link.close();
        }

        let client_ref = self.client_ref();
        for channel in inner.channels.snapshot() {
            channel.set_client(client_ref.clone());
        }

        info!(
            address = %inner.config.address,
            timeout_ms = timeout.as_millis() as u64,
            "Connecting"
        );

        // The slot stays locked across `open` so the link and timer are
        // installed before any event of this generation is handled.
        let mut slot = lock::lock(&inner.slot);
        if slot.generation != generation || slot.state != ConnectionState::Connecting {
            return;
        }

        let sink = EventSink::new(Arc::downgrade(inner), generation);
        match inner.transport.open(&inner.config.address, sink) {
            Ok(link) => {
                slot.link = Some(link);
                slot.timer = self.arm_connect_timer(generation, timeout);
            }
            Err(err) => {
                slot.state = ConnectionState::Disconnected;
                drop(slot);
                inner.report(EddError::connect(format!(
                    "error while dialing ws {} : {}",
                    inner.config.address, err.message
                )));
            }
        }
    }

    fn arm_connect_timer(&self, generation: u64, timeout: Duration) -> Option<AbortHandle> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime available, connect timeout is not enforced");
                return None;
            }
        };

        let client = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(client) = client.upgrade() {
                client.connect_timed_out(generation);
            }
        });
        Some(task.abort_handle())
    }

    /// Closes the connection. Only effective while connected.
    pub fn stop(&self) {
        let link = {
            let mut slot = lock::lock(&self.inner.slot);
            if slot.state != ConnectionState::Connected {
                debug!(state = %slot.state, "Stop ignored, not connected");
                return;
            }
            slot.state = ConnectionState::Disconnected;
            slot.generation += 1;
            slot.cancel_timer();
            slot.link.take()
        };

        if let Some(link) = link {
            link.close();
        }

        self.inner.metrics.connection_closed();
        info!(address = %self.inner.config.address, "Connection stopped");
        self.inner.notify(Lifecycle::Disconnected);
    }

    /// Encodes `envelope` with the active codec and writes it.
    ///
    /// Returns `false`, after reporting the failure to the error callback,
    /// when the connection is not established or the write fails.
    pub fn send(&self, envelope: &Envelope) -> bool {
        if !self.is_connected() {
            self.inner
                .report(EddError::inactive_connection(INACTIVE_CONNECTION));
            return false;
        }

        let codec = self.inner.codec();
        let raw = match codec.encode(envelope) {
            Ok(raw) => raw,
            Err(err) => {
                self.inner.report(err);
                return false;
            }
        };
        self.inner.write(raw)
    }

    /// Writes a pre-encoded frame verbatim. Same contract as [`send`](Self::send).
    pub fn send_raw(&self, raw: WireMessage) -> bool {
        self.inner.write(raw)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        lock::lock(&self.inner.slot).state
    }

    /// Returns `true` while the connection is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Snapshot of the most recent connection attempt.
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        let slot = lock::lock(&self.inner.slot);
        slot.info.clone().map(|mut info| {
            info.state = slot.state;
            info
        })
    }

    /// Snapshot of the client counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl std::fmt::Debug for EddClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EddClient")
            .field("address", &self.inner.config.address)
            .field("state", &self.state())
            .field("channels", &self.inner.channels.len())
            .finish()
    }
}

impl ClientInner {
    fn codec(&self) -> Arc<dyn Codec> {
        lock::read(&self.codec).clone()
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        lock::lock(&self.slot).generation == generation
    }

    /// Entry point for transport signals. Returns `false` if the event
    /// belongs to a superseded connection and was dropped.
    pub(crate) fn handle_event(&self, generation: u64, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Open => self.on_open(generation),
            TransportEvent::Message(raw) => self.on_message(generation, raw),
            TransportEvent::Close => self.on_close(generation),
            TransportEvent::Error(fault) => self.on_transport_error(generation, fault),
        }
    }

    fn on_open(&self, generation: u64) -> bool {
        {
            let mut slot = lock::lock(&self.slot);
            if slot.generation != generation {
                return false;
            }
            if slot.state != ConnectionState::Connecting {
                debug!(state = %slot.state, "Ignoring open signal");
                return true;
            }
            slot.state = ConnectionState::Connected;
            slot.cancel_timer();
            if let Some(info) = slot.info.as_mut() {
                info.connected_at = Some(Utc::now());
            }
        }

        self.metrics.connection_opened();
        info!(address = %self.config.address, "Connected");
        self.notify(Lifecycle::Connected);
        true
    }

    fn on_close(&self, generation: u64) -> bool {
        let (previous, link) = {
            let mut slot = lock::lock(&self.slot);
            if slot.generation != generation {
                return false;
            }
            let previous = slot.state;
            slot.state = ConnectionState::Disconnected;
            slot.cancel_timer();
            (previous, slot.link.take())
        };
        drop(link);

        match previous {
            ConnectionState::Connected => {
                self.metrics.connection_closed();
                info!(address = %self.config.address, "Disconnected");
                self.notify(Lifecycle::Disconnected);
            }
            ConnectionState::Connecting => {
                self.report(EddError::connect(
                    "ws connection closed before it was established",
                ));
            }
            other => debug!(state = %other, "Ignoring close signal"),
        }
        true
    }

    fn on_transport_error(&self, generation: u64, fault: TransportFault) -> bool {
        if !self.is_current(generation) {
            return false;
        }

        warn!(code = ?fault.code, detail = %fault.reason, "Transport error");
        let mut err = EddError::transport(format!(
            "error in socket communication: {}",
            close_code::describe(fault.code, &fault.reason)
        ));
        err.payload = Some(json!({ "code": fault.code, "detail": fault.reason }));
        self.report(err);
        true
    }

    fn on_message(&self, generation: u64, raw: WireMessage) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.metrics.message_received();

        if let Err(err) = validator::validate_inbound(&raw, self.config.max_message_size) {
            self.report(err);
            return true;
        }

        let codec = self.codec();
        match codec.decode(&raw) {
            Ok(envelope) => self.dispatch(envelope),
            Err(err) => {
                warn!(codec = codec.name(), binary = raw.is_binary(), "Dropping undecodable message");
                self.report(err);
            }
        }
        true
    }

    /// Routes one decoded envelope.
    fn dispatch(&self, envelope: Envelope) {
        if envelope.is_error() {
            self.report(EddError::remote(envelope.body));
            return;
        }

        let Some(channel) = self.channels.get(&envelope.channel) else {
            warn!(
                channel = %envelope.channel,
                name = %envelope.name,
                body = %envelope.body,
                "Received message from unknown channel"
            );
            self.report(EddError::unknown_channel(format!(
                "received message from unknown channel '{}'",
                envelope.channel
            )));
            return;
        };

        let Envelope { channel: alias, name, body } = envelope;
        match catch_unwind(AssertUnwindSafe(|| channel.route(&name, body))) {
            Ok(true) => debug!(channel = %alias, name = %name, "Message routed"),
            Ok(false) => warn!(channel = %alias, name = %name, "Message not handled by channel"),
            Err(panic) => self.report(EddError::callback(format!(
                "channel '{alias}' panicked while routing '{name}': {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    /// Runs a lifecycle callback on every channel in registry order. A
    /// panicking callback is reported and the remaining channels still run.
    fn notify(&self, lifecycle: Lifecycle) {
        for channel in self.channels.snapshot() {
            let result = catch_unwind(AssertUnwindSafe(|| match lifecycle {
                Lifecycle::Connected => channel.connected(),
                Lifecycle::Disconnected => channel.disconnected(),
            }));
            if let Err(panic) = result {
                self.report(EddError::callback(format!(
                    "{} callback of channel '{}' panicked: {}",
                    lifecycle.as_str(),
                    channel.alias(),
                    panic_message(panic.as_ref())
                )));
            }
        }
    }

    fn write(&self, raw: WireMessage) -> bool {
        let result = {
            let slot = lock::lock(&self.slot);
            match (slot.state, slot.link.as_ref()) {
                (ConnectionState::Connected, Some(link)) => Some(link.send(raw)),
                _ => None,
            }
        };

        match result {
            Some(Ok(())) => {
                self.metrics.message_sent();
                true
            }
            Some(Err(err)) => {
                self.report(err);
                false
            }
            None => {
                self.report(EddError::inactive_connection(INACTIVE_CONNECTION));
                false
            }
        }
    }

    fn connect_timed_out(&self, generation: u64) {
        let link = {
            let mut slot = lock::lock(&self.slot);
            if slot.generation != generation || slot.state != ConnectionState::Connecting {
                return;
            }
            slot.state = ConnectionState::Disconnected;
            slot.generation += 1;
            slot.timer = None;
            slot.link.take()
        };

        if let Some(link) = link {
            link.close();
        }
        warn!(address = %self.config.address, "Connect timed out");
        self.report(EddError::connect("ws connection timeout"));
    }

    /// Delivers an error to the application callback, or logs it.
    pub(crate) fn report(&self, err: EddError) {
        self.metrics.error_reported();
        let handler = lock::read(&self.on_error).clone();
        match handler {
            Some(handler) => {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(err))) {
                    error!(
                        panic = %panic_message(panic.as_ref()),
                        "Error callback panicked"
                    );
                }
            }
            None => error!(kind = %err.kind, "eddwise error: {}", err.message),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
