//! Interactive session: registers console channels, connects, and pumps stdin.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};

use eddwise_core::config::AppConfig;
use eddwise_core::error::{EddError, ErrorKind};
use eddwise_realtime::message::ReservedName;
use eddwise_realtime::{Channel, ClientRef, EddChannel, EddClient, Envelope, PresenceRoster};

use crate::cli::Cli;

/// Channel that logs every application message and handles the reserved
/// vocabulary through its base.
struct ConsoleChannel {
    base: EddChannel,
    roster: Arc<PresenceRoster>,
}

impl ConsoleChannel {
    fn new(alias: &str, credentials: Option<(String, String)>, closed: Arc<Notify>) -> Self {
        let base = EddChannel::new(alias);
        let roster = Arc::new(PresenceRoster::new());
        roster.attach(&base);

        base.on_connected(|ch| info!(channel = %ch.alias(), "Channel connected"));

        let roster_on_close = roster.clone();
        base.on_disconnected(move |ch| {
            info!(channel = %ch.alias(), "Channel disconnected");
            roster_on_close.clear();
            closed.notify_one();
        });

        base.auth_challenged(move |ch, challenge| {
            let basic = ReservedName::AuthBasic.as_str();
            match &credentials {
                Some((username, password)) if challenge.methods.iter().any(|m| m == basic) => {
                    info!(channel = %ch.alias(), username = %username, "Answering auth challenge");
                    ch.send_auth_basic(username.clone(), password.clone());
                }
                Some(_) => warn!(
                    channel = %ch.alias(),
                    methods = ?challenge.methods,
                    "Server does not accept basic auth"
                ),
                None => warn!(
                    channel = %ch.alias(),
                    "Auth challenge received but no credentials were given"
                ),
            }
        });

        base.auth_passed(|ch, pass| info!(channel = %ch.alias(), user_id = %pass.id, "Authenticated"));

        Self { base, roster }
    }
}

impl Channel for ConsoleChannel {
    fn alias(&self) -> &str {
        self.base.alias()
    }

    fn set_client(&self, client: ClientRef) {
        self.base.set_client(client);
    }

    fn route(&self, name: &str, body: Value) -> bool {
        if self.base.route(name, body.clone()) {
            if name.starts_with("edd:user:") {
                info!(
                    channel = %self.alias(),
                    online = ?self.roster.online_ids(),
                    "Presence changed"
                );
            }
            return true;
        }
        info!(channel = %self.alias(), name = %name, body = %body, "Message");
        true
    }

    fn connected(&self) {
        self.base.connected();
    }

    fn disconnected(&self) {
        self.base.disconnected();
    }
}

/// Runs one session until the connection ends, stdin closes, or Ctrl-C.
pub async fn run(config: AppConfig, cli: &Cli) -> Result<(), EddError> {
    let client = EddClient::from_config(config.client)?;
    let closed = Arc::new(Notify::new());

    let closed_on_error = closed.clone();
    client.on_error(move |err| {
        tracing::error!(kind = %err.kind, payload = ?err.payload, "{}", err.message);
        if err.kind == ErrorKind::Connect {
            closed_on_error.notify_one();
        }
    });

    for alias in &cli.channels {
        let channel = ConsoleChannel::new(alias, cli.credentials(), closed.clone());
        client.register(Arc::new(channel))?;
    }

    info!(
        address = %client.address(),
        channels = ?client.channel_aliases(),
        "Starting eddwise client"
    );
    client.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = closed.notified() => {
                info!("Connection ended");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Ok(envelope) => {
                            client.send(&envelope);
                        }
                        Err(e) => warn!("{}", e),
                    }
                }
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    client.stop();
    let metrics = client.metrics();
    info!(
        sent = metrics.messages_sent,
        received = metrics.messages_received,
        errors = metrics.errors_reported,
        "Session finished"
    );
    Ok(())
}

/// Parses `<channel> <name> [json body]`. A missing body is `null`.
fn parse_line(line: &str) -> Result<Envelope, EddError> {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let (Some(channel), Some(name)) = (parts.next(), parts.next()) else {
        return Err(EddError::validation(
            "expected '<channel> <name> [json body]'",
        ));
    };

    let body = match parts.next().map(str::trim) {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
        _ => Value::Null,
    };
    Ok(Envelope::new(channel, name, body))
}
