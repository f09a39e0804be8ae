//! Tool-call dispatch for the chat protocol.
//!
//! The dispatcher is the single entry point the chat system invokes per tool
//! call. It publishes two capabilities (direct code execution and stored
//! tool execution) and holds one hard invariant: every outcome, success or
//! failure, returns to the chat system as a plain string, because the chat
//! protocol models tool results as opaque text content. No error value ever
//! crosses the dispatcher boundary, and no failed call disturbs the shared
//! transport.

#![warn(missing_docs, clippy::pedantic)]

mod dispatcher;
mod memory;
mod registry;

/// The dispatcher, its collaborator stores, and the capability call shapes.
pub use dispatcher::{
    AgentStore, CapabilityCall, DispatchTimeouts, RUN_CODE, RUN_TOOL, ToolDispatcher, ToolStore,
    run_code_definition, run_tool_definition,
};
/// Map-backed stores for demos and tests.
pub use memory::{InMemoryAgentStore, InMemoryToolStore};
/// Capability registry published to the chat protocol.
pub use registry::{
    Capability, CapabilityHandle, CapabilityRegistry, RegistryError, RegistryResult,
    ToolDefinition,
};
