//! # PopBench
//!
//! `popbench` is a load generator for MQTT brokers. It starts N concurrent
//! virtual clients, each publishing a fixed number of messages over its own
//! connection, measures the publish-to-acknowledge latency of every message,
//! and aggregates per-client and cross-client statistics into a report.
//!
//! ## Core Modules
//!
//! - `client`: one virtual client and its generator → publisher → result pipeline.
//! - `runner`: launches all clients and collects their results.
//! - `stats`: per-client accumulation and cross-client aggregation.
//! - `transport`: the broker connection seam and its MQTT implementation.
//! - `report`: text, JSON and CSV rendering of a run.
//! - `config`: loading and validating benchmark settings.
//! - `cli`: command line flags layered over the configuration.
//! - `utils`: error types and logging setup.

pub mod cli;
pub mod client;
pub mod config;
pub mod report;
pub mod runner;
pub mod stats;
pub mod transport;
pub mod utils;
