//! Engine event stream types
//!
//! The engine translates everything the wire produces into one ordered
//! stream of [`EngineEvent`]s, so the consumer is a single state-transition
//! function with no callback wiring.

use bytes::Bytes;

/// Outcome of a single subscription within a batch subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Broker accepted the subscription at this QoS (possibly downgraded)
    Granted(u8),
    /// Broker rejected the subscription
    Rejected,
}

/// A message delivered by the broker
///
/// Ephemeral: not retained past filtering and formatting.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Topic the message was published to
    pub topic: String,
    /// Raw payload bytes
    pub payload: Bytes,
    /// Delivery QoS
    pub qos: u8,
    /// Retained-message flag
    pub retain: bool,
}

/// Lifecycle and message events, in strict delivery order
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Broker acknowledged the connect handshake
    HandshakeAck {
        /// Broker resumed an existing session
        session_present: bool,
    },
    /// Broker answered a batch subscribe, one grant per requested topic
    SubAck { grants: Vec<Grant> },
    /// An established connection was lost
    ConnectionLost,
    /// A reconnect attempt failed; the engine retries on a fixed interval
    ReconnectAttempt {
        /// Attempts since the connection was last up
        attempt: u64,
    },
    /// Diagnostic detail for a transport-level error
    Error { message: String },
    /// A message arrived
    Message(MessageEvent),
    /// Graceful disconnect confirmed; no further events follow
    Closed,
}
