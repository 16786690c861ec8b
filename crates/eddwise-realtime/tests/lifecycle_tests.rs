//! Connection lifecycle against an in-memory transport.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use eddwise_core::ErrorKind;
use eddwise_core::config::client::ClientConfig;
use eddwise_core::error::EddError;
use eddwise_realtime::{
    ConnectionState, EddChannel, EddClient, EventSink, JsonCodec, Transport, TransportEvent,
    TransportFault, TransportLink, WireMessage,
};

use helpers::{ADDRESS, CallLog, TestClient};

fn recording_channel(alias: &str, calls: &CallLog) -> Arc<EddChannel> {
    let channel = Arc::new(EddChannel::new(alias));
    let on_open = calls.clone();
    channel.on_connected(move |ch| on_open.push(format!("connected:{}", ch.alias())));
    let on_close = calls.clone();
    channel.on_disconnected(move |ch| on_close.push(format!("disconnected:{}", ch.alias())));
    channel
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let t = TestClient::new();
    assert_eq!(t.client.state(), ConnectionState::Idle);

    t.client.start();
    t.client.start();
    assert_eq!(t.transport.open_count(), 1);
    assert_eq!(t.client.state(), ConnectionState::Connecting);

    assert!(t.transport.emit(TransportEvent::Open));
    t.client.start();
    assert_eq!(t.transport.open_count(), 1);
    assert_eq!(t.transport.last_address(), ADDRESS);
    assert!(t.client.is_connected());
    assert!(t.errors.is_empty());
}

#[tokio::test]
async fn test_open_notifies_channels_in_registry_order() {
    let t = TestClient::new();
    let calls = CallLog::default();
    for alias in ["zeta", "alpha", "mid"] {
        t.client.register(recording_channel(alias, &calls)).unwrap();
    }

    t.connect();

    assert_eq!(
        calls.entries(),
        vec!["connected:zeta", "connected:alpha", "connected:mid"]
    );
}

#[tokio::test]
async fn test_panicking_callback_does_not_stop_others() {
    let t = TestClient::new();
    let calls = CallLog::default();

    let faulty = Arc::new(EddChannel::new("faulty"));
    faulty.on_connected(|_| panic!("callback exploded"));
    t.client.register(faulty).unwrap();
    t.client.register(recording_channel("healthy", &calls)).unwrap();

    t.connect();

    assert_eq!(calls.entries(), vec!["connected:healthy"]);
    let errors = t.errors.all();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Callback);
    assert!(errors[0].message.contains("faulty"));
    assert!(errors[0].message.contains("callback exploded"));
}

#[tokio::test(start_paused = true)]
async fn test_open_cancels_connect_timeout() {
    let t = TestClient::new();
    t.client.start_with_timeout(Duration::from_millis(100));
    assert!(t.transport.emit(TransportEvent::Open));

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(t.errors.is_empty());
    assert!(t.client.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_reports_error_and_fails_connection() {
    let t = TestClient::new();
    let calls = CallLog::default();
    t.client.register(recording_channel("chat", &calls)).unwrap();

    t.client.start_with_timeout(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(500)).await;

    let errors = t.errors.all();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Connect);
    assert_eq!(errors[0].message, "ws connection timeout");
    assert_eq!(t.client.state(), ConnectionState::Disconnected);
    assert_eq!(t.transport.close_count(), 1);

    // A late open from the abandoned dial is ignored.
    assert!(!t.transport.emit(TransportEvent::Open));
    assert_eq!(t.client.state(), ConnectionState::Disconnected);
    assert!(calls.entries().is_empty());
    assert_eq!(t.transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_comes_from_config() {
    let mut config = ClientConfig::for_address(ADDRESS);
    config.connect_timeout_ms = 50;
    let t = TestClient::with_config(config);

    t.client.start();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(t.errors.is_empty());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(t.errors.len(), 1);
}

#[tokio::test]
async fn test_close_notifies_every_channel_once() {
    let t = TestClient::new();
    let calls = CallLog::default();
    t.client.register(recording_channel("a", &calls)).unwrap();
    t.client.register(recording_channel("b", &calls)).unwrap();
    t.connect();

    assert!(t.transport.emit(TransportEvent::Close));
    assert!(t.transport.emit(TransportEvent::Close));

    assert_eq!(t.client.state(), ConnectionState::Disconnected);
    assert_eq!(
        calls.entries(),
        vec!["connected:a", "connected:b", "disconnected:a", "disconnected:b"]
    );
    assert!(t.errors.is_empty());
}

#[tokio::test]
async fn test_stop_twice_closes_once() {
    let t = TestClient::new();
    let calls = CallLog::default();
    t.client.register(recording_channel("chat", &calls)).unwrap();
    t.connect();

    t.client.stop();
    t.client.stop();

    assert_eq!(t.transport.close_count(), 1);
    assert_eq!(t.client.state(), ConnectionState::Disconnected);

    // The transport's own close signal for the stopped link is dropped.
    assert!(!t.transport.emit(TransportEvent::Close));
    assert_eq!(calls.entries(), vec!["connected:chat", "disconnected:chat"]);
}

#[tokio::test]
async fn test_stop_only_acts_while_connected() {
    let t = TestClient::new();
    t.client.stop();
    assert_eq!(t.client.state(), ConnectionState::Idle);

    t.client.start();
    t.client.stop();
    assert_eq!(t.client.state(), ConnectionState::Connecting);
    assert_eq!(t.transport.close_count(), 0);
}

#[tokio::test]
async fn test_restart_after_disconnect_uses_new_transport() {
    let t = TestClient::new();
    t.connect();
    t.transport.emit(TransportEvent::Close);

    t.client.start();
    assert_eq!(t.transport.open_count(), 2);

    // Signals from the first connection no longer count.
    assert!(!t.transport.sink(0).emit(TransportEvent::Open));
    assert_eq!(t.client.state(), ConnectionState::Connecting);
    assert!(!t.transport.sink(0).is_current());
    assert!(t.transport.sink(1).is_current());

    assert!(t.transport.emit(TransportEvent::Open));
    assert!(t.client.is_connected());
}

#[tokio::test]
async fn test_dial_failure_reports_connect_error() {
    let t = TestClient::new();
    t.transport.fail_next_open("connection refused");

    t.client.start();

    let errors = t.errors.all();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Connect);
    assert_eq!(
        errors[0].message,
        format!("error while dialing ws {ADDRESS} : connection refused")
    );
    assert_eq!(t.client.state(), ConnectionState::Disconnected);

    t.connect();
    assert!(t.client.is_connected());
}

#[tokio::test]
async fn test_close_before_open_reports_connect_error() {
    let t = TestClient::new();
    let calls = CallLog::default();
    t.client.register(recording_channel("chat", &calls)).unwrap();

    t.client.start();
    t.transport.emit(TransportEvent::Close);

    assert_eq!(t.client.state(), ConnectionState::Disconnected);
    assert!(calls.entries().is_empty());
    let errors = t.errors.all();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Connect);
}

#[tokio::test]
async fn test_transport_error_is_reported_without_state_change() {
    let t = TestClient::new();
    t.connect();

    t.transport
        .emit(TransportEvent::Error(TransportFault::new(Some(1002), "bad frame")));

    assert!(t.client.is_connected());
    let errors = t.errors.all();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Transport);
    assert_eq!(
        errors[0].message,
        "error in socket communication: An endpoint is terminating the connection due to a protocol error"
    );
    let payload = errors[0].payload.clone().unwrap();
    assert_eq!(payload["code"], 1002);
    assert_eq!(payload["detail"], "bad frame");
}

#[tokio::test]
async fn test_unknown_close_code_reason() {
    let t = TestClient::new();
    t.connect();
    t.transport
        .emit(TransportEvent::Error(TransportFault::new(Some(4321), "")));

    assert!(t.errors.all()[0].message.ends_with("Unknown reason"));
}

#[tokio::test]
async fn test_channels_are_bound_before_first_dispatch() {
    let t = TestClient::new();
    let early = Arc::new(EddChannel::new("early"));
    t.client.register(early.clone()).unwrap();
    assert!(early.is_bound());

    t.client.start();
    assert!(early.is_bound());

    let late = Arc::new(EddChannel::new("late"));
    t.client.register(late.clone()).unwrap();
    assert!(late.is_bound());
}

#[tokio::test]
async fn test_codec_swap_rejected_while_active() {
    let t = TestClient::new();
    t.client.set_codec(Arc::new(JsonCodec)).unwrap();

    t.client.start();
    let err = t.client.set_codec(Arc::new(JsonCodec)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    t.transport.emit(TransportEvent::Open);
    assert!(t.client.set_codec(Arc::new(JsonCodec)).is_err());

    t.client.stop();
    assert!(t.client.set_codec(Arc::new(JsonCodec)).is_ok());
}

#[tokio::test]
async fn test_connection_info_and_metrics() {
    let t = TestClient::new();
    assert!(t.client.connection_info().is_none());

    t.client.start();
    let info = t.client.connection_info().unwrap();
    assert_eq!(info.state, ConnectionState::Connecting);
    assert_eq!(info.address, ADDRESS);
    assert_eq!(info.codec, "json");
    assert!(info.connected_at.is_none());

    t.transport.emit(TransportEvent::Open);
    let info = t.client.connection_info().unwrap();
    assert_eq!(info.state, ConnectionState::Connected);
    assert!(info.connected_at.is_some());

    t.client.stop();
    let metrics = t.client.metrics();
    assert_eq!(metrics.connections_opened, 1);
    assert_eq!(metrics.connections_closed, 1);
}

/// Transport whose dial completes on its own thread, like a socket task.
struct ThreadedTransport {
    sent: Arc<AtomicUsize>,
}

struct CountingLink {
    sent: Arc<AtomicUsize>,
}

impl TransportLink for CountingLink {
    fn send(&self, _message: WireMessage) -> Result<(), EddError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {}
}

impl Transport for ThreadedTransport {
    fn open(&self, _address: &str, events: EventSink) -> Result<Box<dyn TransportLink>, EddError> {
        std::thread::spawn(move || {
            events.emit(TransportEvent::Open);
        });
        Ok(Box::new(CountingLink {
            sent: self.sent.clone(),
        }))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connected_callback_can_send_when_open_arrives_from_another_thread() {
    let sent = Arc::new(AtomicUsize::new(0));
    let transport = Arc::new(ThreadedTransport { sent: sent.clone() });
    let client =
        EddClient::with_transport(ClientConfig::for_address(ADDRESS), transport).unwrap();

    let errors = Arc::new(Mutex::new(Vec::new()));
    let recorder = errors.clone();
    client.on_error(move |err| recorder.lock().unwrap().push(err));

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let auth = Arc::new(EddChannel::new("auth"));
    auth.on_connected(move |ch| {
        let delivered = ch.send_auth_basic("u", "p");
        let _ = tx.lock().unwrap().send(delivered);
    });
    client.register(auth).unwrap();

    let cycles = 200;
    for _ in 0..cycles {
        client.start();
        let delivered = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("connected callback ran");
        assert!(delivered);
        client.stop();
    }

    assert!(errors.lock().unwrap().is_empty());
    assert_eq!(sent.load(Ordering::SeqCst), cycles);
}
