//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error - QoS out of range
    #[error("invalid QoS {qos}: must be 0, 1 or 2")]
    InvalidQos {
        /// The rejected value
        qos: u8,
    },

    /// Validation error - message count limit must be positive
    #[error("invalid message limit {limit}: must be at least 1")]
    InvalidLimit {
        /// The rejected value
        limit: u64,
    },

    /// Validation error - client certificate and key must be paired
    #[error("TLS client auth requires both a certificate and a key")]
    IncompleteClientAuth,

    /// Validation error - no topics to subscribe to
    #[error("no topics configured - at least one topic is required")]
    NoTopics,

    /// Validation error - empty topic pattern
    #[error("topic must not be empty")]
    EmptyTopic,
}
