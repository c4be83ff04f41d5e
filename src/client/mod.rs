//! The `client` module implements one virtual benchmark client.
//!
//! Each client runs a three-stage pipeline (generator → publisher → result
//! loop) over its own broker connection and reports one `RunResults`.

pub mod bench_client;
pub mod message;
pub mod pipeline;

pub use bench_client::Client;
pub use message::{Message, PayloadSpec, Qos};
