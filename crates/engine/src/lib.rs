//! mqtail broker engine
//!
//! Wraps the MQTT client in a small event-driven surface: the caller starts
//! a connection with [`connect`], receives an ordered stream of
//! [`EngineEvent`]s, and issues subscribe/disconnect requests through the
//! [`EngineHandle`]. Reconnection is handled inside the engine on a fixed
//! interval; the consumer only sees the attempts go by.

mod error;
mod event;
mod params;
mod rumqtt;

pub use error::{EngineError, Result};
pub use event::{EngineEvent, Grant, MessageEvent};
pub use params::{
    ConnectionParameters, Subscription, SubscriptionSet, TlsMaterial, RECONNECT_INTERVAL,
};
pub use rumqtt::{connect, EngineHandle};
