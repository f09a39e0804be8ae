//! Transport configuration.

use std::time::Duration;

/// Default broker URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "nats://127.0.0.1:4222";

/// Default delay between connection attempts while the broker is unreachable.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Connection settings for the broker transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    server_url: String,
    reconnect_delay: Duration,
}

impl TransportConfig {
    /// Creates a configuration pointing at the supplied broker URL.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Sets the delay between connection attempts.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Returns the broker URL.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns the delay between connection attempts.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}
