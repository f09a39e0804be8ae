//! Shared request/reply broker transport.
//!
//! One logical broker connection per process, shared by all concurrent
//! callers. The connection is dialed lazily on first use, survives the broker
//! starting after this process, and is transparently re-established after it
//! reports closed. Request/reply correlation is the broker client's job;
//! concurrent requests multiplex independently over the shared connection.

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod nats;
mod traits;

/// Connection settings for the broker transport.
pub use config::TransportConfig;
/// NATS-backed production transport.
pub use nats::NatsTransport;
/// Transport trait and failure taxonomy.
pub use traits::{BrokerTransport, TransportError, TransportResult};
