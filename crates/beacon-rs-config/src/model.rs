//! Configuration schema for Beacon.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root config for the Beacon client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BeaconConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl BeaconConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> BeaconConfigBuilder {
        BeaconConfigBuilder::new()
    }
}

/// Builder for assembling a `BeaconConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct BeaconConfigBuilder {
    config: BeaconConfig,
}

impl BeaconConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: BeaconConfig::default(),
        }
    }

    /// Set the server endpoint url.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.url = url.into();
        self
    }

    /// Set the connection attempt timeout in milliseconds.
    pub fn connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.server.connect_timeout_ms = timeout_ms;
        self
    }

    /// Replace the delivery channel configuration.
    pub fn delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.config.delivery = delivery;
        self
    }

    /// Replace the UI configuration.
    pub fn ui(mut self, ui: UiConfig) -> Self {
        self.config.ui = ui;
        self
    }

    /// Finalize and return the built `BeaconConfig`.
    pub fn build(self) -> BeaconConfig {
        self.config
    }
}

/// Remote event source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ServerConfig {
    /// Connection attempt timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Default websocket endpoint.
fn default_server_url() -> String {
    "ws://127.0.0.1:8080/events".to_string()
}

/// Default connection attempt timeout.
fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Delivery channel sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_delivery_buffer")]
    pub buffer: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            buffer: default_delivery_buffer(),
        }
    }
}

/// Default number of buffered delivery events before the producer waits.
fn default_delivery_buffer() -> usize {
    256
}

/// Terminal UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_input_char_limit")]
    pub input_char_limit: usize,
    #[serde(default = "default_input_poll_ms")]
    pub input_poll_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            input_char_limit: default_input_char_limit(),
            input_poll_ms: default_input_poll_ms(),
        }
    }
}

/// Default maximum length of a chat input line.
fn default_input_char_limit() -> usize {
    255
}

/// Default terminal input poll interval.
fn default_input_poll_ms() -> u64 {
    30
}
