//! Virtual client
//!
//! A `Client` owns one pipeline: it spawns the generator and publisher stages
//! and runs the result loop itself, folding every completed message into
//! `RunStats`. Once the publisher signals it is done, the loop reports a
//! single `RunResults` to the coordinator and ends. A pipeline that dies
//! early reports nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::client::message::{PayloadSpec, Qos};
use crate::client::pipeline::{Generator, Publisher};
use crate::config::BenchConfig;
use crate::stats::{RunResults, RunStats};
use crate::transport::Connection;

#[derive(Debug, Clone)]
pub struct Client {
    pub id: usize,
    pub topic: Arc<str>,
    pub qos: Qos,
    pub payload: PayloadSpec,
    pub count: usize,
    pub wait: Duration,
    pub quiet: bool,
}

impl Client {
    pub fn new(id: usize, config: &BenchConfig) -> Self {
        Self {
            id,
            topic: config.topic.clone(),
            qos: config.qos,
            payload: config.payload.clone(),
            count: config.count,
            wait: config.wait,
            quiet: config.quiet,
        }
    }

    /// Runs the whole pipeline over `connection` and sends the results on `results`.
    pub async fn run<C>(self, connection: C, results: mpsc::Sender<RunResults>)
    where
        C: Connection + 'static,
    {
        let (new_tx, new_rx) = mpsc::channel(1);
        let (pub_tx, mut pub_rx) = mpsc::channel(1);
        let (gen_done_tx, gen_done_rx) = oneshot::channel();
        let (pub_done_tx, mut pub_done_rx) = oneshot::channel();

        let started = Instant::now();

        let generator = Generator {
            count: self.count,
            topic: self.topic.clone(),
            qos: self.qos,
            payload: self.payload.clone(),
        };
        tokio::spawn(generator.run(new_tx, gen_done_tx));

        let publisher = Publisher {
            id: self.id,
            connection,
            wait: self.wait,
            quiet: self.quiet,
        };
        tokio::spawn(publisher.run(new_rx, gen_done_rx, pub_tx, pub_done_tx));

        let mut stats = RunStats::with_capacity(self.count);
        let publisher_finished = loop {
            tokio::select! {
                biased;

                Some(msg) = pub_rx.recv() => match msg.flight_time() {
                    Some(flight) => stats.record_success(flight),
                    None => {
                        let sent_at = msg.sent_at.map(|t| t.duration_since(started));
                        error!(client = self.id, topic = %msg.topic, ?sent_at, "error publishing message");
                        stats.record_failure();
                    }
                },
                done = &mut pub_done_rx => break done.is_ok(),
            }
        };

        // Results that do not cover every message are not reported; the
        // coordinator then fails the run with a lost client.
        if !publisher_finished || stats.accounted() != self.count {
            error!(
                client = self.id,
                expected = self.count,
                accounted = stats.accounted(),
                publisher_finished,
                "pipeline ended before every message was accounted for"
            );
            return;
        }

        let res = stats.finish(self.id, self.count, started.elapsed());
        debug!(client = self.id, successes = res.successes, failures = res.failures, "client finished");
        if results.send(res).await.is_err() {
            error!(client = self.id, "result collector is gone");
        }
    }
}
