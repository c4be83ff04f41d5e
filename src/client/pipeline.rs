//! Generator and publisher stages of a client pipeline
//!
//! Both stages run as their own tasks and hand messages over capacity-1
//! channels, so a slow downstream stage pushes back instead of dropping.
//! Completion is signalled on dedicated oneshots rather than by closing the
//! channels: the publisher only acts on the generator's signal once its input
//! queue is empty, and fires its own signal after its last message has been
//! handed downstream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::message::{Message, PayloadSpec, Qos};
use crate::transport::Connection;
use crate::utils::error::PublishError;

const PROGRESS_EVERY: usize = 100;

/// Everything the generator needs to build a client's messages.
#[derive(Debug, Clone)]
pub struct Generator {
    pub count: usize,
    pub topic: Arc<str>,
    pub qos: Qos,
    pub payload: PayloadSpec,
}

impl Generator {
    /// Emits exactly `count` messages in order, then signals `done`.
    pub async fn run(self, out: mpsc::Sender<Message>, done: oneshot::Sender<()>) {
        for _ in 0..self.count {
            let msg = Message::new(self.topic.clone(), self.qos, self.payload.materialize());
            if out.send(msg).await.is_err() {
                // publisher is gone, nobody is left to count the rest
                return;
            }
        }
        let _ = done.send(());
    }
}

/// Publisher stage of one client.
pub struct Publisher<C> {
    pub id: usize,
    pub connection: C,
    pub wait: Duration,
    /// No progress logging.
    pub quiet: bool,
}

impl<C: Connection> Publisher<C> {
    /// Connects, then publishes every generated message and forwards it
    /// downstream, success or failure.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<Message>,
        mut generator_done: oneshot::Receiver<()>,
        out: mpsc::Sender<Message>,
        done: oneshot::Sender<()>,
    ) {
        match self.connection.connect().await {
            Ok(()) => info!(client = self.id, "connected to the broker"),
            Err(e) => error!(client = self.id, error = %e, "error connecting to the broker"),
        }

        let mut published = 0usize;
        loop {
            tokio::select! {
                biased;

                Some(mut msg) = input.recv() => {
                    self.publish(&mut msg).await;
                    if out.send(msg).await.is_err() {
                        return;
                    }
                    published += 1;
                    if !self.quiet && published % PROGRESS_EVERY == 0 {
                        info!(client = self.id, published, "keeps publishing...");
                    }
                }
                _ = &mut generator_done => break,
            }
        }

        self.connection.disconnect().await;
        let _ = done.send(());
        debug!(client = self.id, published, "done publishing");
    }

    async fn publish(&mut self, msg: &mut Message) {
        msg.sent_at = Some(Instant::now());

        let outcome = match self
            .connection
            .publish(&msg.topic, msg.qos, msg.payload.clone())
            .await
        {
            Ok(token) => token.wait_timeout(self.wait).await,
            Err(e) => Err(PublishError::Connection(e)),
        };

        match outcome {
            Ok(()) => {
                msg.acknowledged_at = Some(Instant::now());
                msg.failed = false;
            }
            Err(PublishError::Timeout(wait)) => {
                warn!(client = self.id, topic = %msg.topic, ?wait, "timeout sending message");
                msg.failed = true;
            }
            Err(PublishError::Connection(e)) => {
                warn!(client = self.id, topic = %msg.topic, error = %e, "error sending message");
                msg.failed = true;
            }
        }
    }
}
