//! Error types for the protocol engine

use std::io;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building parameters or talking to the broker
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to read TLS material from disk
    #[error("failed to read TLS material '{path}': {source}")]
    TlsRead {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Client certificate auth was requested without a CA bundle
    #[error("TLS client auth requires a CA certificate (--ca)")]
    ClientAuthRequiresCa,

    /// The client request queue rejected an operation
    #[error("broker request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}
