//! Core shared types for the runbox execution dispatch pipeline.

#![warn(missing_docs, clippy::pedantic)]

mod context;
mod error;
mod execution;
mod ids;
mod records;

/// Ambient per-call context handed to the dispatcher.
pub use context::ToolContext;
/// Error taxonomy and result alias shared across the pipeline.
pub use error::{DispatchError, DispatchResult};
/// Payloads exchanged with the sandboxed runtime.
pub use execution::{ExecutionRequest, ExecutionResponse};
/// Unique identifier minted for every code submission.
pub use ids::SubmissionId;
/// Externally owned rows consumed through the collaborator stores.
pub use records::{AgentRecord, StoredTool};
