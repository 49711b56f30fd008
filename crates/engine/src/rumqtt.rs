//! rumqttc-backed engine
//!
//! One background task owns the rumqttc event loop and translates whatever
//! it yields into [`EngineEvent`]s on an mpsc channel, in delivery order.
//! Reconnects are driven here on a fixed interval; the consumer only
//! observes the attempts.

use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter,
    SubscribeReasonCode, TlsConfiguration, Transport,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::Result;
use crate::event::{EngineEvent, Grant, MessageEvent};
use crate::params::{ConnectionParameters, SubscriptionSet, KEEP_ALIVE};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the rumqttc request queue
const REQUEST_QUEUE_CAPACITY: usize = 10;

/// Handle for issuing requests against a live connection
pub struct EngineHandle {
    client: AsyncClient,
    shutdown: watch::Sender<bool>,
}

impl EngineHandle {
    /// Issue one batch subscribe for the full set
    ///
    /// Queue-side failures are returned here; the broker's per-topic grants
    /// arrive later as [`EngineEvent::SubAck`].
    pub async fn subscribe(&self, subs: &SubscriptionSet) -> Result<()> {
        let filters: Vec<SubscribeFilter> = subs
            .iter()
            .map(|s| SubscribeFilter::new(s.topic.clone(), qos_level(s.qos)))
            .collect();
        self.client.subscribe_many(filters).await?;
        Ok(())
    }

    /// Request a graceful disconnect; confirmation arrives as `Closed`
    pub async fn disconnect(&self) {
        let _ = self.shutdown.send(true);
        let _ = self.client.disconnect().await;
    }
}

/// Start the connection and return the handle plus the ordered event stream
///
/// Never blocks the caller; the first connect attempt happens on the
/// spawned task.
pub fn connect(params: &ConnectionParameters) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
    let mut options = MqttOptions::new(
        params.client_id.clone(),
        params.host.clone(),
        params.port,
    );
    options.set_keep_alive(KEEP_ALIVE);
    options.set_clean_session(true);

    if let Some((username, password)) = &params.credentials {
        options.set_credentials(username.clone(), password.clone());
    }

    if let Some(tls) = &params.tls {
        let config = match &tls.ca {
            Some(ca) => TlsConfiguration::Simple {
                ca: ca.clone(),
                alpn: None,
                client_auth: tls.client_auth.clone(),
            },
            // No custom CA: rustls with system roots
            None => TlsConfiguration::default(),
        };
        options.set_transport(Transport::tls_with_config(config));
    }

    let (client, eventloop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(poll_loop(
        eventloop,
        tx,
        shutdown_rx,
        params.connect_timeout,
        params.reconnect_interval,
    ));

    (
        EngineHandle {
            client,
            shutdown: shutdown_tx,
        },
        rx,
    )
}

/// Drive the rumqttc event loop until the consumer goes away or the
/// connection winds down after a graceful disconnect request.
async fn poll_loop(
    mut eventloop: EventLoop,
    tx: mpsc::Sender<EngineEvent>,
    shutdown: watch::Receiver<bool>,
    connect_timeout: Duration,
    retry_interval: Duration,
) {
    let mut connected = false;
    let mut attempt: u64 = 0;

    loop {
        let disconnecting = *shutdown.borrow();

        // Each connect attempt is bounded; an established connection is
        // kept alive by the protocol's own keep-alive.
        let polled = if connected || disconnecting {
            eventloop.poll().await
        } else {
            match tokio::time::timeout(connect_timeout, eventloop.poll()).await {
                Ok(res) => res,
                Err(_) => {
                    attempt += 1;
                    debug!(attempt, "connect attempt timed out");
                    if tx
                        .send(EngineEvent::ReconnectAttempt { attempt })
                        .await
                        .is_err()
                    {
                        return;
                    }
                    tokio::time::sleep(retry_interval).await;
                    continue;
                }
            }
        };

        match polled {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                connected = true;
                attempt = 0;
                let ev = EngineEvent::HandshakeAck {
                    session_present: ack.session_present,
                };
                if tx.send(ev).await.is_err() {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                let grants = ack
                    .return_codes
                    .iter()
                    .map(|code| match code {
                        SubscribeReasonCode::Success(qos) => Grant::Granted(*qos as u8),
                        SubscribeReasonCode::Failure => Grant::Rejected,
                    })
                    .collect();
                if tx.send(EngineEvent::SubAck { grants }).await.is_err() {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let ev = EngineEvent::Message(MessageEvent {
                    topic: publish.topic,
                    payload: publish.payload,
                    qos: publish.qos as u8,
                    retain: publish.retain,
                });
                if tx.send(ev).await.is_err() {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                if disconnecting {
                    let _ = tx.send(EngineEvent::Closed).await;
                    return;
                }
                if connected {
                    connected = false;
                    if tx.send(EngineEvent::ConnectionLost).await.is_err() {
                        return;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                if disconnecting {
                    let _ = tx.send(EngineEvent::Closed).await;
                    return;
                }
                let ev = EngineEvent::Error {
                    message: e.to_string(),
                };
                if tx.send(ev).await.is_err() {
                    return;
                }
                if connected {
                    connected = false;
                    if tx.send(EngineEvent::ConnectionLost).await.is_err() {
                        return;
                    }
                } else {
                    attempt += 1;
                    if tx
                        .send(EngineEvent::ReconnectAttempt { attempt })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}

/// Map a validated QoS number to the wire representation
fn qos_level(qos: u8) -> QoS {
    match qos {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}
