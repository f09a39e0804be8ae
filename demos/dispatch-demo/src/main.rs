//! One-shot dispatch demo.
//!
//! Wires the real broker transport, in-memory stores seeded with a sample
//! tool, and the capability registry, then resolves a single call:
//!
//! ```text
//! dispatch-demo code "console.log(6 * 7);"
//! dispatch-demo tool greet
//! ```
//!
//! Expects a NATS broker on localhost and a sandbox runtime answering the
//! execution subject; without the runtime the demo prints the
//! service-unavailable text instead of hanging.

use std::sync::Arc;

use anyhow::Result;
use runbox_client::ExecutionClient;
use runbox_dispatch::{
    CapabilityRegistry, InMemoryAgentStore, InMemoryToolStore, RUN_CODE, RUN_TOOL, ToolDispatcher,
};
use runbox_primitives::{StoredTool, ToolContext};
use runbox_transport::{NatsTransport, TransportConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "code".to_owned());
    let rest: Vec<String> = args.collect();

    let transport = Arc::new(NatsTransport::new(TransportConfig::default()));
    let client = ExecutionClient::new(transport);

    let tools = Arc::new(InMemoryToolStore::new());
    tools.insert(StoredTool::new(
        "greet",
        r#"export default function run(input, context) {
  return `hello ${input.name ?? "world"} (${context.why})`;
}
"#,
    ));

    let dispatcher = Arc::new(ToolDispatcher::new(
        client,
        tools,
        Arc::new(InMemoryAgentStore::new()),
    ));
    let registry = CapabilityRegistry::new();
    dispatcher.register(&registry)?;

    let ctx = ToolContext::anonymous();
    let output = match mode.as_str() {
        "tool" => {
            let tool_id = rest
                .first()
                .cloned()
                .unwrap_or_else(|| "greet".to_owned());
            let call = json!({
                "tool_id": tool_id,
                "why": "demo run",
                "input": { "name": "runbox" }
            });
            registry.call(RUN_TOOL, call, &ctx).await
        }
        _ => {
            let code = if rest.is_empty() {
                "console.log(6 * 7);".to_owned()
            } else {
                rest.join(" ")
            };
            registry.call(RUN_CODE, json!({ "code": code }), &ctx).await
        }
    };

    println!("{output}");
    Ok(())
}
