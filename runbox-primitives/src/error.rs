//! Error taxonomy shared across the dispatch pipeline.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the dispatch pipeline.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure kinds a tool call can surface.
///
/// Every kind is recoverable: the dispatcher renders all of them to plain
/// text at its boundary, and none poison the shared transport or the process.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Required call arguments were missing or malformed. Detected before any
    /// network traffic.
    #[error("{reason}")]
    Validation {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The referenced tool identifier does not exist. A normal outcome the
    /// calling agent is expected to recover from.
    #[error("no tool found with id `{public_id}`")]
    NotFound {
        /// Identifier that failed to resolve.
        public_id: String,
    },

    /// No reply arrived within the deadline.
    #[error("execution timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// Nothing is answering the execution subject; the runtime is not running.
    #[error("the code execution service is not running")]
    ServiceUnavailable,

    /// Any other transport or protocol failure. Least specific category.
    #[error("{reason}")]
    Transport {
        /// Underlying failure message.
        reason: String,
    },
}

impl DispatchError {
    /// Creates a validation error from the supplied reason.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates a not-found error naming the missing identifier.
    #[must_use]
    pub fn not_found(public_id: impl Into<String>) -> Self {
        Self::NotFound {
            public_id: public_id.into(),
        }
    }

    /// Creates a timeout error carrying the exceeded deadline.
    #[must_use]
    pub const fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates a transport error from the supplied reason.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_the_deadline() {
        let err = DispatchError::timeout(Duration::from_millis(15_000));
        assert_eq!(err.to_string(), "execution timed out after 15000ms");
    }

    #[test]
    fn not_found_names_the_identifier() {
        let err = DispatchError::not_found("weather-tool");
        assert_eq!(err.to_string(), "no tool found with id `weather-tool`");
    }

    #[test]
    fn service_unavailable_names_the_runtime() {
        let message = DispatchError::ServiceUnavailable.to_string();
        assert!(message.contains("not running"));
    }
}
