//! Connection parameters and subscriptions
//!
//! [`ConnectionParameters`] is built once from the resolved options, before
//! the first connect attempt. Building reads any TLS material from disk, so
//! an unreadable file fails fast instead of surfacing mid-handshake.

use std::fs;
use std::path::Path;
use std::time::Duration;

use mqtail_config::Options;

use crate::error::{EngineError, Result};

/// Fixed delay between reconnect attempts. Not configurable.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Keep-alive interval sent to the broker
pub(crate) const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// TLS material loaded into memory
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    /// CA certificate bundle (PEM); None means system roots
    pub ca: Option<Vec<u8>>,
    /// Client certificate and private key (PEM)
    pub client_auth: Option<(Vec<u8>, Vec<u8>)>,
}

/// Immutable connection parameters for one run
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    /// Broker hostname or IP
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier (supplied or generated)
    pub client_id: String,
    /// Optional username/password
    pub credentials: Option<(String, String)>,
    /// TLS material; None means plain TCP
    pub tls: Option<TlsMaterial>,
    /// Per-attempt connect timeout
    pub connect_timeout: Duration,
    /// Fixed reconnect interval
    pub reconnect_interval: Duration,
}

impl ConnectionParameters {
    /// Build parameters from the resolved options
    ///
    /// # Errors
    ///
    /// Fails if TLS material cannot be read, or client auth is requested
    /// without a CA bundle.
    pub fn build(opts: &Options) -> Result<Self> {
        let broker = &opts.broker;

        let tls = if broker.tls_enabled() {
            let ca = broker.ca_path.as_deref().map(read_pem).transpose()?;
            let client_auth = match (&broker.cert_path, &broker.key_path) {
                (Some(cert), Some(key)) => {
                    if ca.is_none() {
                        return Err(EngineError::ClientAuthRequiresCa);
                    }
                    Some((read_pem(cert)?, read_pem(key)?))
                }
                _ => None,
            };
            Some(TlsMaterial { ca, client_auth })
        } else {
            None
        };

        let credentials = match (&broker.username, &broker.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };

        Ok(Self {
            host: broker.host.clone(),
            port: broker.effective_port(),
            client_id: broker
                .client_id
                .clone()
                .unwrap_or_else(generate_client_id),
            credentials,
            tls,
            connect_timeout: Duration::from_secs(broker.connect_timeout_secs),
            reconnect_interval: RECONNECT_INTERVAL,
        })
    }

    /// Broker URL for status output, scheme derived from the TLS inputs
    pub fn url(&self) -> String {
        let scheme = if self.tls.is_some() { "mqtts" } else { "mqtt" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// One (topic pattern, requested QoS) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Topic pattern; `+`/`#` wildcards are the broker's business
    pub topic: String,
    /// Requested QoS (0, 1 or 2)
    pub qos: u8,
}

/// Ordered set of subscriptions, built once from the resolved options
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Build the set from the options record
    pub fn from_options(opts: &Options) -> Self {
        let qos = opts.subscribe.qos;
        Self {
            subscriptions: opts
                .subscribe
                .topics
                .iter()
                .map(|t| Subscription {
                    topic: t.clone(),
                    qos,
                })
                .collect(),
        }
    }

    /// Subscriptions in request order
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

/// Generate a client id of the form `mqtail-xxxxxxxx`
fn generate_client_id() -> String {
    format!("mqtail-{:08x}", rand::random::<u32>())
}

fn read_pem(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| EngineError::TlsRead {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "params_test.rs"]
mod params_test;
