//! The `error` module defines the error types used across `popbench`.
//!
//! Only configuration errors and report I/O are fatal. Connection and publish
//! errors are data: they end up in a client's failure count.

use std::time::Duration;

use thiserror::Error;

/// Invalid or unreadable benchmark settings. Reported before any client starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("number of clients should be >= 1, given: {0}")]
    InvalidClients(i64),

    #[error("messages count should be >= 1, given: {0}")]
    InvalidCount(i64),

    #[error("qos should be 0, 1 or 2, given: {0}")]
    InvalidQos(i64),

    #[error("payload size should be >= 0, given: {0}")]
    InvalidSize(i64),

    #[error("wait timeout should be > 0 ms, given: {0}")]
    InvalidWait(i64),

    #[error("unknown output format '{0}' (expected text, json or csv)")]
    InvalidFormat(String),

    #[error("invalid broker url '{url}': {reason}")]
    InvalidBroker { url: String, reason: String },

    #[error("private client key path missing")]
    MissingClientKey,

    #[error("client certificate path missing")]
    MissingClientCert,

    #[error("error reading TLS material '{path}': {reason}")]
    Tls { path: String, reason: String },
}

/// Failure of the broker connection collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("not connected to the broker")]
    NotConnected,

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connection refused by broker: {0}")]
    Refused(String),

    #[error("connection lost: {0}")]
    Lost(String),

    #[error("publish request rejected: {0}")]
    Request(String),

    #[error("acknowledgement dropped before completion")]
    Dropped,
}

/// Outcome of a single failed publish. Never escapes a client pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("no acknowledgement within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Top-level error for a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("invalid arguments: {0}")]
    Config(#[from] ConfigError),

    #[error("expected {expected} client results, received {received}")]
    ClientLost { expected: usize, received: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
