//! The tool-call front end invoked by the chat system.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use runbox_client::ExecutionClient;
use runbox_primitives::{
    AgentRecord, DispatchError, DispatchResult, ExecutionRequest, StoredTool, ToolContext,
};
use runbox_synth::{ToolCallPayload, synthesize};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::registry::{CapabilityRegistry, RegistryResult, ToolDefinition};

/// Name of the direct code execution capability.
pub const RUN_CODE: &str = "run_code";

/// Name of the stored-tool execution capability.
pub const RUN_TOOL: &str = "run_tool";

/// Store of user-authored tools, addressed by public identifier.
///
/// The interface is row-or-absent by contract; storage failures are the
/// implementation's concern behind it.
#[async_trait]
pub trait ToolStore: Send + Sync {
    /// Fetches the stored tool with the supplied public identifier.
    async fn get_by_public_id(&self, public_id: &str) -> Option<StoredTool>;
}

/// Store of agent rows, consulted only for permission grants.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Fetches the agent row with the supplied public identifier.
    async fn get_by_public_id(&self, public_id: &str) -> Option<AgentRecord>;
}

/// Per-capability submission deadlines.
///
/// Direct snippets are interactive and low-risk; stored tools carry
/// user-authored logic and get twice the deadline.
#[derive(Debug, Clone, Copy)]
pub struct DispatchTimeouts {
    code: Duration,
    tool: Duration,
}

impl DispatchTimeouts {
    /// Sets the deadline for direct code execution.
    #[must_use]
    pub const fn with_code_timeout(mut self, timeout: Duration) -> Self {
        self.code = timeout;
        self
    }

    /// Sets the deadline for stored-tool execution.
    #[must_use]
    pub const fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool = timeout;
        self
    }

    /// Returns the deadline for direct code execution.
    #[must_use]
    pub const fn code(self) -> Duration {
        self.code
    }

    /// Returns the deadline for stored-tool execution.
    #[must_use]
    pub const fn tool(self) -> Duration {
        self.tool
    }
}

impl Default for DispatchTimeouts {
    fn default() -> Self {
        Self {
            code: Duration::from_millis(15_000),
            tool: Duration::from_millis(30_000),
        }
    }
}

/// One tool call as the chat protocol hands it over.
#[derive(Debug, Clone)]
pub enum CapabilityCall {
    /// Execute a literal snippet.
    RunCode {
        /// Source text to execute.
        code: String,
        /// Optional structured input accepted by the calling protocol.
        input: Option<Value>,
    },
    /// Execute a stored tool by public identifier.
    RunTool {
        /// Public identifier of the stored tool.
        tool_id: String,
        /// Caller's stated reason for the invocation.
        why: Option<String>,
        /// Optional structured input handed to the tool.
        input: Option<Value>,
    },
}

impl CapabilityCall {
    /// Returns the capability name used in failure prefixes and logs.
    #[must_use]
    pub const fn capability(&self) -> &'static str {
        match self {
            Self::RunCode { .. } => RUN_CODE,
            Self::RunTool { .. } => RUN_TOOL,
        }
    }
}

/// Front end resolving chat tool calls into sandbox submissions.
///
/// Dispatch is invoked concurrently, one call per tool call the agent emits;
/// there is no serialization here and calls share nothing but the transport.
pub struct ToolDispatcher {
    client: ExecutionClient,
    tools: Arc<dyn ToolStore>,
    agents: Arc<dyn AgentStore>,
    timeouts: DispatchTimeouts,
}

impl ToolDispatcher {
    /// Creates a dispatcher with default timeouts.
    #[must_use]
    pub fn new(
        client: ExecutionClient,
        tools: Arc<dyn ToolStore>,
        agents: Arc<dyn AgentStore>,
    ) -> Self {
        Self {
            client,
            tools,
            agents,
            timeouts: DispatchTimeouts::default(),
        }
    }

    /// Overrides the submission deadlines.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: DispatchTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Returns the configured deadlines.
    #[must_use]
    pub const fn timeouts(&self) -> DispatchTimeouts {
        self.timeouts
    }

    /// Resolves one tool call to its text result.
    ///
    /// Never returns an error value: validation failures, unknown tool
    /// identifiers, and execution failures all come back as plain text the
    /// calling agent can read and react to.
    pub async fn dispatch(&self, call: CapabilityCall, ctx: &ToolContext) -> String {
        let capability = call.capability();
        match self.run(call, ctx).await {
            Ok(text) => {
                info!(capability, "tool call completed");
                text
            }
            Err(error) => {
                warn!(capability, %error, "tool call failed");
                render_failure(capability, &error)
            }
        }
    }

    /// Registers both capabilities with the chat registry.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::RegistryError`] when a capability name is already
    /// taken.
    pub fn register(self: &Arc<Self>, registry: &CapabilityRegistry) -> RegistryResult<()> {
        let dispatcher = Arc::clone(self);
        registry.register(
            run_code_definition(),
            move |args: Value, ctx: ToolContext| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { dispatcher.call_with_args(RUN_CODE, args, &ctx).await }
            },
        )?;

        let dispatcher = Arc::clone(self);
        registry.register(
            run_tool_definition(),
            move |args: Value, ctx: ToolContext| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { dispatcher.call_with_args(RUN_TOOL, args, &ctx).await }
            },
        )?;

        Ok(())
    }

    /// Parses raw protocol arguments and dispatches, rendering argument
    /// failures through the same text path as every other failure.
    async fn call_with_args(&self, capability: &'static str, args: Value, ctx: &ToolContext) -> String {
        match parse_call(capability, args) {
            Ok(call) => self.dispatch(call, ctx).await,
            Err(error) => {
                warn!(capability, %error, "tool call rejected");
                render_failure(capability, &error)
            }
        }
    }

    async fn run(&self, call: CapabilityCall, ctx: &ToolContext) -> DispatchResult<String> {
        match call {
            CapabilityCall::RunCode { code, input: _ } => self.run_code(code, ctx).await,
            CapabilityCall::RunTool {
                tool_id,
                why,
                input,
            } => self.run_tool(&tool_id, why, input).await,
        }
    }

    async fn run_code(&self, code: String, ctx: &ToolContext) -> DispatchResult<String> {
        if code.trim().is_empty() {
            return Err(DispatchError::validation("code must not be empty"));
        }

        let mut request = ExecutionRequest::new(code);
        let permissions = self.granted_permissions(ctx).await;
        if !permissions.is_empty() {
            request = request.with_permissions(permissions);
        }

        self.client.execute(&request, self.timeouts.code()).await
    }

    async fn run_tool(
        &self,
        tool_id: &str,
        why: Option<String>,
        input: Option<Value>,
    ) -> DispatchResult<String> {
        let tool_id = tool_id.trim();
        if tool_id.is_empty() {
            return Err(DispatchError::validation("tool id must not be empty"));
        }

        // Fetched fresh on every call so edits between calls take effect.
        let Some(tool) = self.tools.get_by_public_id(tool_id).await else {
            return Err(DispatchError::not_found(tool_id));
        };

        let mut payload = ToolCallPayload::new(tool.public_id());
        if let Some(why) = why {
            payload = payload.with_why(why);
        }
        if let Some(input) = input {
            payload = payload.with_input(input);
        }

        let program = synthesize(tool.source_text(), &payload).map_err(|error| {
            DispatchError::transport(format!("failed to synthesize tool program: {error}"))
        })?;

        let request = ExecutionRequest::new(program);
        self.client.execute(&request, self.timeouts.tool()).await
    }

    /// Resolves the permission grants for the calling agent.
    ///
    /// A missing agent, a missing permission field, or malformed permission
    /// JSON all resolve to an empty grant list; permission lookup never fails
    /// a call.
    async fn granted_permissions(&self, ctx: &ToolContext) -> Vec<String> {
        let Some(agent_id) = ctx.agent_public_id() else {
            return Vec::new();
        };
        let Some(record) = self.agents.get_by_public_id(agent_id).await else {
            return Vec::new();
        };
        match record.permissions() {
            Some(raw) => parse_permission_list(agent_id, raw),
            None => Vec::new(),
        }
    }
}

fn render_failure(capability: &str, error: &DispatchError) -> String {
    format!("{capability} error: {error}")
}

fn parse_permission_list(agent_id: &str, raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|error| {
        warn!(agent_id, %error, "malformed permission list, granting none");
        Vec::new()
    })
}

#[derive(Deserialize)]
struct RunCodeArgs {
    code: String,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Deserialize)]
struct RunToolArgs {
    tool_id: String,
    #[serde(default)]
    why: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

fn parse_call(capability: &'static str, args: Value) -> DispatchResult<CapabilityCall> {
    match capability {
        RUN_CODE => {
            let args: RunCodeArgs = serde_json::from_value(args).map_err(invalid_args)?;
            Ok(CapabilityCall::RunCode {
                code: args.code,
                input: args.input,
            })
        }
        RUN_TOOL => {
            let args: RunToolArgs = serde_json::from_value(args).map_err(invalid_args)?;
            Ok(CapabilityCall::RunTool {
                tool_id: args.tool_id,
                why: args.why,
                input: args.input,
            })
        }
        other => Err(DispatchError::validation(format!(
            "unknown capability `{other}`"
        ))),
    }
}

fn invalid_args(error: serde_json::Error) -> DispatchError {
    DispatchError::validation(format!("invalid arguments: {error}"))
}

/// Definition of the direct code execution capability.
#[must_use]
pub fn run_code_definition() -> ToolDefinition {
    ToolDefinition::new(
        RUN_CODE,
        "Execute a JavaScript snippet in the sandboxed runtime and return its output.",
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "JavaScript source to execute."
                },
                "input": {
                    "type": "object",
                    "description": "Optional structured input for the snippet."
                }
            },
            "required": ["code"]
        }),
    )
}

/// Definition of the stored-tool execution capability.
#[must_use]
pub fn run_tool_definition() -> ToolDefinition {
    ToolDefinition::new(
        RUN_TOOL,
        "Invoke a stored user tool by its public id, passing structured input.",
        json!({
            "type": "object",
            "properties": {
                "tool_id": {
                    "type": "string",
                    "description": "Public id of the stored tool to run."
                },
                "input": {
                    "type": "object",
                    "description": "Structured input handed to the tool."
                },
                "why": {
                    "type": "string",
                    "description": "Short reason for this invocation, shown to the tool."
                }
            },
            "required": ["tool_id"]
        }),
    )
}
