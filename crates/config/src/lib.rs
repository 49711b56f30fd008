//! mqtail configuration
//!
//! TOML-based configuration loading with sensible defaults. The resolved
//! [`Options`] record is the single source of truth for a run: defaults are
//! overlaid by the config file, then by environment variables and CLI flags
//! (the flag layer, including `MQTAIL_*` env fallbacks, is applied by the
//! binary on top of the loaded record).
//!
//! # Example Minimal Config
//!
//! ```toml
//! [broker]
//! host = "broker.example.net"
//!
//! [subscribe]
//! topics = ["sensors/#"]
//! ```

mod error;
mod output;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use output::{ColorMode, FormatMode, OutputOptions, TimestampMode, Verbosity};

/// Default broker port for plain TCP
pub const DEFAULT_PORT: u16 = 1883;
/// Default broker port when TLS is enabled
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// The resolved options record
///
/// All sections are optional in the file; missing keys take defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Broker connection settings
    pub broker: BrokerOptions,

    /// Subscription settings
    pub subscribe: SubscribeOptions,

    /// Message filter settings
    pub filter: FilterOptions,

    /// Output rendering settings
    pub output: OutputOptions,
}

/// Broker connection section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerOptions {
    /// Broker hostname or IP
    pub host: String,
    /// Broker port; defaults to 1883, or 8883 when TLS is on
    pub port: Option<u16>,
    /// Optional username
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Client identifier; generated when absent
    pub client_id: Option<String>,
    /// Enable TLS (implied by any of the ca/cert/key paths)
    pub tls: bool,
    /// Path to a CA certificate bundle (PEM)
    pub ca_path: Option<String>,
    /// Path to a client certificate (PEM)
    pub cert_path: Option<String>,
    /// Path to a client private key (PEM)
    pub key_path: Option<String>,
    /// Per-attempt connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            client_id: None,
            tls: false,
            ca_path: None,
            cert_path: None,
            key_path: None,
            connect_timeout_secs: 10,
        }
    }
}

impl BrokerOptions {
    /// Whether TLS is in effect, explicitly or implied by TLS material
    pub fn tls_enabled(&self) -> bool {
        self.tls || self.ca_path.is_some() || self.cert_path.is_some() || self.key_path.is_some()
    }

    /// The effective port after applying scheme defaults
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.tls_enabled() {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_PORT
        })
    }
}

/// Subscription section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscribeOptions {
    /// Topic patterns to subscribe to (`+`/`#` wildcards allowed)
    pub topics: Vec<String>,
    /// Requested QoS for every subscription (0, 1 or 2)
    pub qos: u8,
    /// Stop after forwarding this many messages
    pub max_messages: Option<u64>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            qos: 0,
            max_messages: None,
        }
    }
}

/// Filter section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Regex the topic must match
    pub topic_pattern: Option<String>,
    /// Regex the payload (as text) must match
    pub payload_pattern: Option<String>,
    /// Forward retained messages
    pub show_retained: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            topic_pattern: None,
            payload_pattern: None,
            show_retained: true,
        }
    }
}

impl Options {
    /// Load options from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        contents.parse()
    }

    /// Validate the resolved record
    ///
    /// Called once after all layers are applied; violations are fatal
    /// setup errors.
    pub fn validate(&self) -> Result<()> {
        if self.subscribe.qos > 2 {
            return Err(ConfigError::InvalidQos {
                qos: self.subscribe.qos,
            });
        }
        if let Some(limit) = self.subscribe.max_messages {
            if limit == 0 {
                return Err(ConfigError::InvalidLimit { limit });
            }
        }
        if self.broker.cert_path.is_some() != self.broker.key_path.is_some() {
            return Err(ConfigError::IncompleteClientAuth);
        }
        if self.subscribe.topics.is_empty() {
            return Err(ConfigError::NoTopics);
        }
        if self.subscribe.topics.iter().any(|t| t.is_empty()) {
            return Err(ConfigError::EmptyTopic);
        }
        Ok(())
    }
}

impl FromStr for Options {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;
