//! Run coordinator
//!
//! Starts every virtual client as an independent task and collects exactly one
//! `RunResults` per client from a shared channel. Results arrive in whatever
//! order clients finish; they are sorted by client id before the totals are
//! computed so the report does not depend on scheduling.

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info};

use crate::client::Client;
use crate::config::BenchConfig;
use crate::report::Report;
use crate::stats::{RunResults, TotalResults};
use crate::transport::Connection;
use crate::utils::error::BenchError;

/// Runs the benchmark. `connect` builds the connection of client `id`.
pub async fn run<F, C>(config: &BenchConfig, mut connect: F) -> Result<Report, BenchError>
where
    F: FnMut(usize) -> C,
    C: Connection + 'static,
{
    let expected = config.clients;
    let (tx, mut rx) = mpsc::channel::<RunResults>(1);
    let mut handles = Vec::with_capacity(expected);

    let started = Instant::now();
    for id in 0..expected {
        info!(client = id, "starting client");
        let client = Client::new(id, config);
        handles.push(tokio::spawn(client.run(connect(id), tx.clone())));
    }
    drop(tx);

    let mut runs = Vec::with_capacity(expected);
    while runs.len() < expected {
        match rx.recv().await {
            Some(res) => runs.push(res),
            None => break,
        }
    }
    let total_time = started.elapsed();

    if runs.len() < expected {
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "client task failed");
            }
        }
        return Err(BenchError::ClientLost {
            expected,
            received: runs.len(),
        });
    }

    runs.sort_by_key(|r| r.id);
    let totals = TotalResults::from_runs(&runs, total_time);
    info!(
        clients = expected,
        successes = totals.successes,
        failures = totals.failures,
        "benchmark finished"
    );

    Ok(Report { runs, totals })
}

#[cfg(test)]
mod tests;
