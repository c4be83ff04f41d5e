//! Broker connection seam
//!
//! The benchmark core only needs three things from a protocol client:
//! connect once, start a publish, and wait a bounded time for its
//! acknowledgement. `Connection` captures exactly that so the pipeline can be
//! driven by the MQTT client in production and by a scripted in-memory
//! connection in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::oneshot;

use crate::client::message::Qos;
use crate::utils::error::{ConnectionError, PublishError};

/// Sending half of a publish acknowledgement.
pub type AckSender = oneshot::Sender<Result<(), ConnectionError>>;

#[async_trait]
pub trait Connection: Send {
    /// Performs the connect handshake. Blocks until it completes or fails.
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Starts a publish. An `Err` means the request could not even be issued.
    async fn publish(
        &mut self,
        topic: &str,
        qos: Qos,
        payload: Bytes,
    ) -> Result<PublishToken, ConnectionError>;

    /// Closes the connection once the client is done publishing.
    async fn disconnect(&mut self) {}
}

/// Pending acknowledgement of a single publish.
#[derive(Debug)]
pub struct PublishToken {
    rx: oneshot::Receiver<Result<(), ConnectionError>>,
}

impl PublishToken {
    /// A token completed by sending on the returned `AckSender`.
    pub fn pending() -> (AckSender, PublishToken) {
        let (tx, rx) = oneshot::channel();
        (tx, PublishToken { rx })
    }

    /// A token that is already resolved.
    pub fn ready(result: Result<(), ConnectionError>) -> Self {
        let (tx, token) = Self::pending();
        let _ = tx.send(result);
        token
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&mut self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }

    /// Waits up to `timeout` for the acknowledgement.
    ///
    /// A dropped sender counts as a connection error, not a timeout.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<(), PublishError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Err(_) => Err(PublishError::Timeout(timeout)),
            Ok(Err(_)) => Err(PublishError::Connection(ConnectionError::Dropped)),
            Ok(Ok(result)) => result.map_err(PublishError::Connection),
        }
    }
}
