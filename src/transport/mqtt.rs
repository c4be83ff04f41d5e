//! MQTT connection backed by `rumqttc`
//!
//! `rumqttc` splits a connection into an `AsyncClient` (request handle) and an
//! `EventLoop` that must be polled for anything to happen. `connect` polls the
//! loop until CONNACK, then hands it to a background driver task that keeps
//! polling for the lifetime of the connection. Polling again after an error is
//! what makes `rumqttc` reconnect, so reconnection stays transparent to the
//! publisher.
//!
//! Acknowledgements are correlated through `Inflight`: a publish is queued
//! with its `AckSender` under the same lock that issues the request, the
//! outgoing PUBLISH event assigns it a packet id, and PUBACK (QoS 1) or PUBCOMP
//! (QoS 2) with that id completes it. QoS 0 publishes complete once written to
//! the network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::tokio_rustls::rustls::ClientConfig;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::message::Qos;
use crate::config::BenchConfig;
use crate::transport::connection::{AckSender, Connection, PublishToken};
use crate::utils::error::{ConfigError, ConnectionError};

const REQUEST_CAPACITY: usize = 10;
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);
/// Largest packet MQTT can encode (256 MiB).
const MAX_PACKET_SIZE: usize = 268_435_455;

/// Parsed broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl BrokerEndpoint {
    /// Parses `scheme://host[:port]`. `tcp`/`mqtt` are plain, `ssl`/`tls`/`mqtts`
    /// use TLS. Missing ports default to 1883 and 8883 respectively.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBroker {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        let secure = match url.scheme() {
            "tcp" | "mqtt" => false,
            "ssl" | "tls" | "mqtts" => true,
            _ => return Err(invalid("scheme must be one of tcp, mqtt, ssl, tls, mqtts")),
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .to_string();
        let port = url.port().unwrap_or(if secure { 8883 } else { 1883 });

        Ok(Self { host, port, secure })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl From<Qos> for QoS {
    fn from(qos: Qos) -> Self {
        match qos {
            Qos::AtMostOnce => QoS::AtMostOnce,
            Qos::AtLeastOnce => QoS::AtLeastOnce,
            Qos::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

/// A written QoS 1/2 publish waiting for its final ack.
#[derive(Debug)]
struct Pending {
    ack: AckSender,
    /// QoS 2 publish that got its PUBREC; only PUBCOMP is left.
    released: bool,
}

/// Publishes awaiting a packet id, and publishes awaiting their final ack.
///
/// After a connection loss `rumqttc` writes every unacknowledged publish
/// again with its old packet id, ahead of anything new. Those ids are kept
/// in `replays` so the rewrite is not mistaken for the next queued publish.
/// Several publishes can share a packet id when the broker acks out of
/// order; acks for an id complete them oldest first.
#[derive(Debug, Default)]
struct Inflight {
    queued: VecDeque<(Qos, AckSender)>,
    by_pkid: HashMap<u16, VecDeque<Pending>>,
    replays: HashSet<u16>,
}

impl Inflight {
    fn written(&mut self, pkid: u16) {
        if pkid != 0 && self.replays.remove(&pkid) {
            return;
        }
        let Some((qos, ack)) = self.queued.pop_front() else {
            return;
        };
        match qos {
            Qos::AtMostOnce => {
                let _ = ack.send(Ok(()));
            }
            Qos::AtLeastOnce | Qos::ExactlyOnce => {
                self.by_pkid.entry(pkid).or_default().push_back(Pending {
                    ack,
                    released: false,
                });
            }
        }
    }

    /// PUBREC for a QoS 2 publish.
    fn received(&mut self, pkid: u16) {
        if let Some(pending) = self
            .by_pkid
            .get_mut(&pkid)
            .and_then(|q| q.iter_mut().find(|p| !p.released))
        {
            pending.released = true;
        }
    }

    /// PUBACK (QoS 1) or PUBCOMP (QoS 2).
    fn acknowledged(&mut self, pkid: u16) {
        let Some(queue) = self.by_pkid.get_mut(&pkid) else {
            return;
        };
        if let Some(pending) = queue.pop_front() {
            let _ = pending.ack.send(Ok(()));
        }
        if queue.is_empty() {
            self.by_pkid.remove(&pkid);
        }
    }

    /// The network went away. Nothing is failed: queued requests and
    /// unacknowledged publishes are sent again once reconnected, and the
    /// publisher's wait bounds how long a message can take.
    fn connection_lost(&mut self) {
        self.replays = self
            .by_pkid
            .iter()
            .filter(|(_, q)| q.iter().any(|p| !p.released))
            .map(|(pkid, _)| *pkid)
            .collect();
    }

    fn fail_all(&mut self, err: &ConnectionError) {
        for (_, ack) in self.queued.drain(..) {
            let _ = ack.send(Err(err.clone()));
        }
        for (_, queue) in self.by_pkid.drain() {
            for pending in queue {
                let _ = pending.ack.send(Err(err.clone()));
            }
        }
        self.replays.clear();
    }
}

fn lock(inflight: &Mutex<Inflight>) -> MutexGuard<'_, Inflight> {
    inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One virtual client's MQTT connection.
pub struct MqttConnection {
    id: usize,
    options: MqttOptions,
    client: Option<AsyncClient>,
    inflight: Arc<Mutex<Inflight>>,
    driver: Option<JoinHandle<()>>,
}

impl MqttConnection {
    pub fn new(id: usize, config: &BenchConfig, tls: Option<Arc<ClientConfig>>) -> Self {
        let mut options = MqttOptions::new(
            config.client_id(id),
            config.broker.host.clone(),
            config.broker.port,
        );
        options
            .set_clean_session(true)
            .set_keep_alive(KEEP_ALIVE)
            .set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

        if let Some(creds) = &config.credentials {
            options.set_credentials(creds.username.clone(), creds.password.clone());
        }
        if let Some(tls) = tls {
            options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(tls)));
        }

        Self {
            id,
            options,
            client: None,
            inflight: Arc::new(Mutex::new(Inflight::default())),
            driver: None,
        }
    }
}

#[async_trait]
impl Connection for MqttConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        let (client, mut eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(ConnectionError::Refused(format!("{:?}", ack.code)));
                    }
                    break;
                }
                Ok(_) => continue,
                Err(rumqttc::ConnectionError::ConnectionRefused(code)) => {
                    return Err(ConnectionError::Refused(format!("{code:?}")));
                }
                Err(e) => return Err(ConnectionError::Connect(e.to_string())),
            }
        }

        self.driver = Some(tokio::spawn(drive(
            self.id,
            eventloop,
            self.inflight.clone(),
        )));
        self.client = Some(client);
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        qos: Qos,
        payload: Bytes,
    ) -> Result<PublishToken, ConnectionError> {
        let client = self.client.as_ref().ok_or(ConnectionError::NotConnected)?;

        // never block here: the request channel stops draining while the
        // broker is unreachable
        let mut inflight = lock(&self.inflight);
        client
            .try_publish(topic, qos.into(), false, payload)
            .map_err(|e| ConnectionError::Request(e.to_string()))?;

        let (ack, token) = PublishToken::pending();
        inflight.queued.push_back((qos, ack));
        Ok(token)
    }

    async fn disconnect(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        if let Err(e) = client.try_disconnect() {
            debug!(client = self.id, error = %e, "disconnect request failed");
            return;
        }
        // let the driver flush DISCONNECT before the connection is dropped
        if let Some(driver) = self.driver.as_mut() {
            if tokio::time::timeout(DISCONNECT_TIMEOUT, driver).await.is_err() {
                debug!(client = self.id, "driver still running after disconnect");
            }
        }
    }
}

impl Drop for MqttConnection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

async fn drive(id: usize, mut eventloop: EventLoop, inflight: Arc<Mutex<Inflight>>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => lock(&inflight).written(pkid),
            Ok(Event::Incoming(Packet::PubAck(ack))) => lock(&inflight).acknowledged(ack.pkid),
            Ok(Event::Incoming(Packet::PubRec(rec))) => lock(&inflight).received(rec.pkid),
            Ok(Event::Incoming(Packet::PubComp(comp))) => {
                lock(&inflight).acknowledged(comp.pkid)
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(client = id, "reconnected to the broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(rumqttc::ConnectionError::RequestsDone) => break,
            Err(e) => {
                warn!(client = id, error = %e, "lost connection to the broker, will reconnect");
                lock(&inflight).connection_lost();
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    lock(&inflight).fail_all(&ConnectionError::NotConnected);
}
