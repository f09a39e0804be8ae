//! Broker transport trait and failure taxonomy.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Result alias used by transport implementations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures a single broker request can surface.
///
/// Timeout and no-responders are separate kinds so callers can distinguish a
/// slow executor from a missing one. No kind is retried inside the
/// transport; retry policy belongs to callers.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No reply arrived within the caller's deadline.
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// Nothing is subscribed to the request subject.
    #[error("no responders on subject `{subject}`")]
    NoResponders {
        /// Subject that went unanswered.
        subject: String,
    },

    /// Any other connection or protocol failure.
    #[error("broker connection error: {reason}")]
    Connection {
        /// Underlying failure message.
        reason: String,
    },
}

impl TransportError {
    /// Creates a timeout error carrying the exceeded deadline.
    #[must_use]
    pub const fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates a no-responders error naming the unanswered subject.
    #[must_use]
    pub fn no_responders(subject: impl Into<String>) -> Self {
        Self::NoResponders {
            subject: subject.into(),
        }
    }

    /// Creates a connection error from the supplied reason.
    #[must_use]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }
}

/// Process-wide handle to the request/reply broker.
///
/// Implementations hold at most one logical connection, established lazily
/// and shared by all concurrent callers. The handle is injected at the
/// process's composition root; tests substitute a fake.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Sends one request on `subject` and waits up to `timeout` for exactly
    /// one reply. Concurrent calls multiplex independently; none blocks
    /// another, and each call's wait is bounded only by its own deadline.
    /// A reply arriving after the deadline is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] when no reply arrives in time,
    /// [`TransportError::NoResponders`] when nothing is subscribed to the
    /// subject, and [`TransportError::Connection`] for every other failure.
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> TransportResult<Bytes>;

    /// Releases the connection. Idempotent; the next request re-establishes
    /// it lazily.
    async fn close(&self);
}
