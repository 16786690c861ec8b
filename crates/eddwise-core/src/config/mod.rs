//! Client configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional TOML
//! file overlaid with `EDD__`-prefixed environment variables. Each sub-module
//! represents a logical configuration section.

pub mod client;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::client::ClientConfig;
use self::logging::LoggingConfig;

use crate::error::EddError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Connection and codec settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Environment variables use the `EDD` prefix with `__` as the section
    /// separator, e.g. `EDD__CLIENT__ADDRESS=ws://host:3000/chat`.
    pub fn load(path: Option<&str>) -> Result<Self, EddError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("EDD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| EddError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| EddError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
