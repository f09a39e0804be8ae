//! NATS-backed production transport.

use std::time::Duration;

use async_nats::connection::State;
use async_nats::{Client, Request, RequestErrorKind};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::traits::{BrokerTransport, TransportError, TransportResult};

/// Shared, lazily-dialed connection to the NATS broker.
///
/// The connection slot is guarded by a mutex so that exactly one dial wins
/// under concurrent first use; the losers wait for it instead of dialing
/// their own. Once established, the underlying client multiplexes concurrent
/// requests on its own and handles reply correlation, so requests never
/// block one another here.
pub struct NatsTransport {
    config: TransportConfig,
    client: Mutex<Option<Client>>,
}

impl NatsTransport {
    /// Creates a transport for the supplied configuration. No connection is
    /// dialed until the first request.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// Returns the configuration this transport was built with.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Returns the live client, dialing one if the slot is empty or the
    /// previous connection reports closed.
    async fn acquire(&self) -> Client {
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.as_ref() {
            if matches!(client.connection_state(), State::Disconnected) {
                debug!("broker connection reported closed, redialing");
                *slot = None;
            } else {
                return client.clone();
            }
        }

        let client = self.dial().await;
        *slot = Some(client.clone());
        client
    }

    /// Dials the broker until it answers.
    ///
    /// The dispatcher is long-lived and may start before the broker or the
    /// runtime, so the bootstrap loop retries without bound at a fixed short
    /// delay instead of failing fast. This is the only wait in the transport
    /// without a deadline.
    async fn dial(&self) -> Client {
        let url = self.config.server_url();
        let mut attempt: u64 = 1;
        loop {
            match async_nats::connect(url).await {
                Ok(client) => {
                    info!(url, "connected to execution broker");
                    return client;
                }
                Err(error) => {
                    warn!(url, attempt, %error, "execution broker unreachable, retrying");
                    tokio::time::sleep(self.config.reconnect_delay()).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl BrokerTransport for NatsTransport {
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> TransportResult<Bytes> {
        let client = self.acquire().await;
        let request = Request::new().payload(payload).timeout(Some(timeout));

        match client.send_request(subject.to_owned(), request).await {
            Ok(message) => {
                debug!(subject, bytes = message.payload.len(), "broker reply received");
                Ok(message.payload)
            }
            Err(error) => Err(classify(error.kind(), &error.to_string(), subject, timeout)),
        }
    }

    async fn close(&self) {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.take() {
            if let Err(error) = client.flush().await {
                debug!(%error, "flush during close failed");
            }
            info!("broker connection released");
        }
    }
}

/// Maps a broker request failure onto the transport taxonomy.
fn classify(
    kind: RequestErrorKind,
    detail: &str,
    subject: &str,
    timeout: Duration,
) -> TransportError {
    match kind {
        RequestErrorKind::TimedOut => TransportError::timeout(timeout),
        RequestErrorKind::NoResponders => TransportError::no_responders(subject),
        RequestErrorKind::Other => TransportError::connection(detail.to_owned()),
    }
}
