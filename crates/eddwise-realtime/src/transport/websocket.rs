//! WebSocket transport over `tokio-tungstenite`.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use eddwise_core::error::EddError;

use super::{EventSink, Transport, TransportEvent, TransportFault, TransportLink};
use crate::message::WireMessage;

/// Dials `ws://` and `wss://` addresses on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Creates a new transport.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn TransportLink>, EddError> {
        if !(address.starts_with("ws://") || address.starts_with("wss://")) {
            return Err(EddError::connect("address must use the ws:// or wss:// scheme"));
        }

        let request = address
            .into_client_request()
            .map_err(|e| EddError::with_source(eddwise_core::ErrorKind::Connect, e.to_string(), e))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EddError::connect(format!("no tokio runtime available: {e}")))?;

        let id = Uuid::new_v4();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        runtime.spawn(run_connection(
            id,
            request,
            events,
            outbound_rx,
            cancel.clone(),
        ));

        debug!(conn_id = %id, address = %address, "WebSocket dial started");

        Ok(Box::new(WebSocketLink {
            id,
            outbound: outbound_tx,
            cancel,
        }))
    }
}

/// Write half handed to the connection manager.
#[derive(Debug)]
struct WebSocketLink {
    id: Uuid,
    outbound: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
}

impl TransportLink for WebSocketLink {
    fn send(&self, message: WireMessage) -> Result<(), EddError> {
        let frame = match message {
            WireMessage::Text(text) => Message::text(text),
            WireMessage::Binary(data) => Message::binary(data),
        };
        self.outbound
            .send(frame)
            .map_err(|_| EddError::transport(format!("connection {} is no longer writable", self.id)))
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WebSocketLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Socket task: dials, then pumps frames both ways until either side closes.
async fn run_connection(
    id: Uuid,
    request: Request,
    events: EventSink,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    let stream = tokio::select! {
        _ = cancel.cancelled() => {
            debug!(conn_id = %id, "Dial abandoned");
            return;
        }
        result = tokio_tungstenite::connect_async(request) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!(conn_id = %id, error = %e, "WebSocket dial failed");
                events.emit(TransportEvent::Error(fault_from_error(&e)));
                events.emit(TransportEvent::Close);
                return;
            }
        }
    };

    info!(conn_id = %id, "WebSocket connection open");
    events.emit(TransportEvent::Open);

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                let _ = write.close().await;
                debug!(conn_id = %id, "WebSocket closed locally");
                break;
            }
            Some(frame) = outbound.recv() => {
                if let Err(e) = write.send(frame).await {
                    warn!(conn_id = %id, error = %e, "WebSocket write failed");
                    events.emit(TransportEvent::Error(fault_from_error(&e)));
                    break;
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    events.emit(TransportEvent::Message(WireMessage::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Binary(data))) => {
                    events.emit(TransportEvent::Message(WireMessage::Binary(data)));
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        let code = u16::from(frame.code);
                        if code != 1000 {
                            events.emit(TransportEvent::Error(TransportFault::new(
                                Some(code),
                                frame.reason.as_str(),
                            )));
                        }
                    }
                    debug!(conn_id = %id, "WebSocket closed by peer");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %id, error = %e, "WebSocket read failed");
                    events.emit(TransportEvent::Error(fault_from_error(&e)));
                    break;
                }
                None => break,
            }
        }
    }

    events.emit(TransportEvent::Close);
}

/// Maps a socket library error onto the closest RFC 6455 close code.
fn fault_from_error(err: &WsError) -> TransportFault {
    let code = match err {
        WsError::Io(_) | WsError::ConnectionClosed | WsError::AlreadyClosed => Some(1006),
        WsError::Protocol(_) => Some(1002),
        WsError::Capacity(_) => Some(1009),
        _ => None,
    };
    TransportFault::new(code, err.to_string())
}
