//! Sandboxed code execution dispatch SDK facade.
//!
//! Depend on this crate via `cargo add runbox`. It bundles the dispatch
//! pipeline crates behind feature flags so embedders can enable only the
//! layers they compose.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use runbox_primitives as primitives;

/// Broker transport (enabled by the `transport` feature).
#[cfg(feature = "transport")]
pub use runbox_transport as transport;

/// Execution client (enabled by the `client` feature).
#[cfg(feature = "client")]
pub use runbox_client as client;

/// Program synthesis for stored tools (enabled by the `synth` feature).
#[cfg(feature = "synth")]
pub use runbox_synth as synth;

/// Tool dispatcher and capability registry (enabled by the `dispatch`
/// feature).
#[cfg(feature = "dispatch")]
pub use runbox_dispatch as dispatch;
