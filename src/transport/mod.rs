//! The `transport` module is responsible for talking to the broker.
//!
//! It defines the `Connection` seam the benchmark pipeline publishes through,
//! the MQTT implementation of it, and the TLS setup for secure brokers.

pub mod connection;
pub mod mqtt;
pub mod tls;

pub use connection::{Connection, PublishToken};
pub use mqtt::MqttConnection;

#[cfg(test)]
pub(crate) mod memory;
