//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use eddwise_core::config::client::ClientConfig;
use eddwise_core::error::EddError;
use eddwise_realtime::codec::Codec;
use eddwise_realtime::{
    EddClient, Envelope, EventSink, JsonCodec, Transport, TransportEvent, TransportLink,
    WireMessage,
};

/// Address every test client dials
pub const ADDRESS: &str = "ws://fake.test/chat";

/// Write half of one fake connection
#[derive(Default)]
pub struct LinkLog {
    pub sent: Mutex<Vec<WireMessage>>,
    pub closes: AtomicUsize,
    pub fail_writes: AtomicBool,
}

struct FakeLink {
    log: Arc<LinkLog>,
}

impl TransportLink for FakeLink {
    fn send(&self, message: WireMessage) -> Result<(), EddError> {
        if self.log.fail_writes.load(Ordering::SeqCst) {
            return Err(EddError::transport("fake write failure"));
        }
        self.log.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn close(&self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// One `open` call seen by the fake transport
pub struct Opened {
    pub address: String,
    pub sink: EventSink,
    pub log: Arc<LinkLog>,
}

/// In-memory transport that records dials and lets tests drive events
#[derive(Default)]
pub struct FakeTransport {
    opens: Mutex<Vec<Opened>>,
    fail_next: Mutex<Option<String>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `open` fail with `reason`
    pub fn fail_next_open(&self, reason: &str) {
        *self.fail_next.lock().unwrap() = Some(reason.to_string());
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().unwrap().len()
    }

    pub fn sink(&self, index: usize) -> EventSink {
        self.opens.lock().unwrap()[index].sink.clone()
    }

    pub fn last_sink(&self) -> EventSink {
        self.opens
            .lock()
            .unwrap()
            .last()
            .expect("transport was never opened")
            .sink
            .clone()
    }

    pub fn last_log(&self) -> Arc<LinkLog> {
        self.opens
            .lock()
            .unwrap()
            .last()
            .expect("transport was never opened")
            .log
            .clone()
    }

    pub fn last_address(&self) -> String {
        self.opens.lock().unwrap().last().unwrap().address.clone()
    }

    /// Emits through the most recent connection's sink
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.last_sink().emit(event)
    }

    /// Emits an inbound JSON text frame
    pub fn deliver(&self, frame: Value) -> bool {
        self.emit(TransportEvent::Message(WireMessage::Text(frame.to_string())))
    }

    /// Total `close` calls across every connection
    pub fn close_count(&self) -> usize {
        self.opens
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.log.closes.load(Ordering::SeqCst))
            .sum()
    }

    /// Frames written on the most recent connection
    pub fn sent(&self) -> Vec<WireMessage> {
        self.last_log().sent.lock().unwrap().clone()
    }

    /// Frames written on the most recent connection, decoded as JSON envelopes
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent()
            .iter()
            .map(|raw| JsonCodec.decode(raw).expect("sent frame is valid JSON"))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn TransportLink>, EddError> {
        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(EddError::connect(reason));
        }
        let log = Arc::new(LinkLog::default());
        self.opens.lock().unwrap().push(Opened {
            address: address.to_string(),
            sink: events,
            log: log.clone(),
        });
        Ok(Box::new(FakeLink { log }))
    }
}

/// Errors captured from the client's error callback
#[derive(Clone, Default)]
pub struct ErrorLog(Arc<Mutex<Vec<EddError>>>);

impl ErrorLog {
    pub fn all(&self) -> Vec<EddError> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Test client wired to a fake transport and an error recorder
pub struct TestClient {
    pub client: EddClient,
    pub transport: Arc<FakeTransport>,
    pub errors: ErrorLog,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::for_address(ADDRESS))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let transport = FakeTransport::new();
        let client = EddClient::with_transport(config, transport.clone())
            .expect("client builds");
        let errors = ErrorLog::default();
        let sink = errors.clone();
        client.on_error(move |err| sink.0.lock().unwrap().push(err));
        Self {
            client,
            transport,
            errors,
        }
    }

    /// Starts and simulates the transport opening
    pub fn connect(&self) {
        self.client.start();
        assert!(self.transport.emit(TransportEvent::Open));
    }
}

/// Builds a `{channel, name, body}` frame
pub fn frame(channel: &str, name: &str, body: Value) -> Value {
    json!({ "channel": channel, "name": name, "body": body })
}

/// Shared, ordered record of callback invocations
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
