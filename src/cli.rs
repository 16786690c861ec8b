//! Command-line arguments.

use clap::Parser;

use eddwise_core::config::AppConfig;

/// Connects to an eddwise server and bridges stdin lines to channels.
///
/// Each stdin line is sent as `<channel> <name> [json body]`.
#[derive(Parser, Debug, Clone)]
#[command(name = "edd-client", version, about)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Server address, e.g. ws://127.0.0.1:3000/chat
    #[arg(short, long)]
    pub address: Option<String>,

    /// Channel alias to register (repeatable)
    #[arg(long = "channel", default_value = "chat")]
    pub channels: Vec<String>,

    /// Username used to answer auth challenges
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password used to answer auth challenges
    #[arg(short, long)]
    pub password: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level filter (overrides configuration)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overlays command-line values onto loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(address) = &self.address {
            config.client.address = address.clone();
        }
        if let Some(timeout) = self.timeout_ms {
            config.client.connect_timeout_ms = timeout;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }

    /// Basic-auth credentials, if both parts were given.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}
