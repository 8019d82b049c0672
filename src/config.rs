//! Configuration management for the relay server
//!
//! Settings are layered: built-in defaults, then an optional `config.toml`,
//! then `RELAY_` prefixed environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9000;
pub const MAX_MESSAGE_LENGTH: usize = 64;
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

const CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "RELAY";

/// Startup configuration for the relay. Changes require a restart.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface to bind the listener on
    pub host: String,

    /// TCP port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// Largest inbound chunk, in bytes, that is relayed
    pub max_message_length: usize,

    /// Relayed chunks buffered per peer before new ones are dropped
    pub outbound_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_message_length: MAX_MESSAGE_LENGTH,
            outbound_queue_capacity: OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Load configuration from ./config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from the named file (extension optional, file optional)
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("max_message_length", MAX_MESSAGE_LENGTH as i64)?
            .set_default("outbound_queue_capacity", OUTBOUND_QUEUE_CAPACITY as i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: RelayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.host.trim().is_empty() {
            return Err(config::ConfigError::Message("host cannot be empty".into()));
        }

        if self.max_message_length == 0 {
            return Err(config::ConfigError::Message(
                "max_message_length must be greater than 0".into(),
            ));
        }

        if self.outbound_queue_capacity == 0 {
            return Err(config::ConfigError::Message(
                "outbound_queue_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address as `host:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Size of the per-connection read buffer.
    ///
    /// One byte larger than the limit so an oversized chunk shows up in a
    /// single read.
    pub fn read_buffer_size(&self) -> usize {
        self.max_message_length + 1
    }
}
