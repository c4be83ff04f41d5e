//! Scripted in-memory connection used by the pipeline and runner tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::message::Qos;
use crate::transport::connection::{AckSender, Connection, PublishToken};
use crate::utils::error::ConnectionError;

/// What the fake broker does with the next publish.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Acknowledge after the given delay.
    Ack(Duration),
    /// Never acknowledge.
    Hang,
    /// Reject the publish request synchronously.
    Reject,
    /// Accept the request, then report a connection error through the token.
    Fail,
    /// Panic inside the publisher task.
    Crash,
}

#[derive(Debug, Clone)]
pub struct Published {
    pub topic: String,
    pub qos: Qos,
    pub payload: Bytes,
}

#[derive(Debug, Default)]
pub struct MemoryConnection {
    script: VecDeque<Outcome>,
    refuse_connect: bool,
    connected: bool,
    hung: Vec<AckSender>,
    pub published: Arc<Mutex<Vec<Published>>>,
    pub connects: Arc<Mutex<usize>>,
}

impl MemoryConnection {
    /// Every publish is acknowledged immediately.
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn scripted(script: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Acknowledges the n-th publish after `latencies_ms[n]` milliseconds.
    pub fn with_latencies(latencies_ms: &[u64]) -> Self {
        Self::scripted(
            latencies_ms
                .iter()
                .map(|ms| Outcome::Ack(Duration::from_millis(*ms))),
        )
    }

    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        *self.connects.lock().unwrap() += 1;
        if self.refuse_connect {
            return Err(ConnectionError::Connect("connection refused".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        qos: Qos,
        payload: Bytes,
    ) -> Result<PublishToken, ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::NotConnected);
        }
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            qos,
            payload,
        });

        match self.script.pop_front().unwrap_or(Outcome::Ack(Duration::ZERO)) {
            Outcome::Ack(delay) if delay.is_zero() => Ok(PublishToken::ready(Ok(()))),
            Outcome::Ack(delay) => {
                let (ack, token) = PublishToken::pending();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = ack.send(Ok(()));
                });
                Ok(token)
            }
            Outcome::Hang => {
                let (ack, token) = PublishToken::pending();
                self.hung.push(ack);
                Ok(token)
            }
            Outcome::Reject => Err(ConnectionError::Request("request queue closed".to_string())),
            Outcome::Fail => Ok(PublishToken::ready(Err(ConnectionError::Lost(
                "broker went away".to_string(),
            )))),
            Outcome::Crash => panic!("publisher crashed"),
        }
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}
