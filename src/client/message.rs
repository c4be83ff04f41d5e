//! Message definitions for the benchmark pipeline
//!
//! A `Message` is one publish attempt. It is created by the generator with no
//! timing, stamped exactly once by the publisher, and read exactly once by the
//! client's result loop. Ownership moves through the pipeline channels, so no
//! stage ever sees a message another stage is still working on.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// MQTT delivery guarantee requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for Qos {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Qos::AtMostOnce),
            1 => Ok(Qos::AtLeastOnce),
            2 => Ok(Qos::ExactlyOnce),
            other => Err(other),
        }
    }
}

/// Payload of every generated message, resolved once per client.
#[derive(Debug, Clone)]
pub enum PayloadSpec {
    /// Same bytes for every message; clones share the buffer.
    Literal(Bytes),
    /// A fresh zero-filled buffer of this many bytes per message.
    Generated(usize),
}

impl PayloadSpec {
    pub fn literal(text: impl Into<String>) -> Self {
        PayloadSpec::Literal(Bytes::from(text.into()))
    }

    /// Produces the payload for the next message.
    pub fn materialize(&self) -> Bytes {
        match self {
            PayloadSpec::Literal(bytes) => bytes.clone(),
            PayloadSpec::Generated(size) => Bytes::from(vec![0u8; *size]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub topic: Arc<str>,
    pub qos: Qos,
    pub payload: Bytes,
    pub sent_at: Option<Instant>,
    pub acknowledged_at: Option<Instant>,
    pub failed: bool,
}

impl Message {
    pub fn new(topic: Arc<str>, qos: Qos, payload: Bytes) -> Self {
        Self {
            topic,
            qos,
            payload,
            sent_at: None,
            acknowledged_at: None,
            failed: false,
        }
    }

    /// Time between publish and acknowledgement, for acknowledged messages only.
    pub fn flight_time(&self) -> Option<Duration> {
        match (self.sent_at, self.acknowledged_at) {
            (Some(sent), Some(acked)) if !self.failed => Some(acked.duration_since(sent)),
            _ => None,
        }
    }
}
