//! Runtime registry for the capabilities published to the chat protocol.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use runbox_primitives::ToolContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Declarative description of one capability: the name the chat protocol
/// invokes it by, the description shown to the model, and a JSON-Schema
/// object describing accepted arguments.
///
/// Definitions are immutable once published for a conversation turn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: Value,
}

impl ToolDefinition {
    /// Creates a definition from its parts. Validation happens at
    /// registration time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON-Schema parameter object.
    #[must_use]
    pub const fn parameters(&self) -> &Value {
        &self.parameters
    }
}

/// Trait implemented by capability executors.
///
/// The chat protocol treats every tool result as opaque text, so the uniform
/// signature returns a plain `String`; implementations render their own
/// failures into it rather than returning error values.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Invokes the capability with the raw argument object.
    async fn call(&self, args: Value, ctx: &ToolContext) -> String;
}

#[async_trait]
impl<F, Fut> Capability for F
where
    F: Send + Sync + Fn(Value, ToolContext) -> Fut,
    Fut: Future<Output = String> + Send,
{
    async fn call(&self, args: Value, ctx: &ToolContext) -> String {
        (self)(args, ctx.clone()).await
    }
}

/// Handle pairing a definition with its executor.
#[derive(Clone)]
pub struct CapabilityHandle {
    definition: ToolDefinition,
    executor: Arc<dyn Capability>,
}

impl CapabilityHandle {
    /// Returns the associated definition.
    #[must_use]
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Executes the underlying capability.
    pub async fn call(&self, args: Value, ctx: &ToolContext) -> String {
        self.executor.call(args, ctx).await
    }
}

/// Registry that stores capabilities keyed by name.
#[derive(Default)]
pub struct CapabilityRegistry {
    inner: RwLock<HashMap<String, CapabilityHandle>>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("capability registry poisoned");
        let names: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("CapabilityRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under its definition's name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDefinition`] when the name is empty
    /// and [`RegistryError::Duplicate`] when it is already taken.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register<C>(&self, definition: ToolDefinition, capability: C) -> RegistryResult<()>
    where
        C: Capability + 'static,
    {
        if definition.name().trim().is_empty() {
            return Err(RegistryError::InvalidDefinition {
                reason: "capability name cannot be empty".into(),
            });
        }

        let mut inner = self.inner.write().expect("capability registry poisoned");
        let name = definition.name().to_owned();
        if inner.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }

        inner.insert(
            name,
            CapabilityHandle {
                definition,
                executor: Arc::new(capability),
            },
        );

        Ok(())
    }

    /// Returns a handle to the capability matching the supplied name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CapabilityHandle> {
        let inner = self.inner.read().ok()?;
        inner.get(name).cloned()
    }

    /// Lists the definitions of all registered capabilities, as handed to
    /// the chat protocol.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        let inner = self.inner.read().expect("capability registry poisoned");
        inner
            .values()
            .map(|handle| handle.definition.clone())
            .collect()
    }

    /// Invokes a capability by name.
    ///
    /// An unknown name comes back as error text, not an error value, because
    /// nothing but strings may cross into the chat protocol.
    pub async fn call(&self, name: &str, args: Value, ctx: &ToolContext) -> String {
        let Some(handle) = self.get(name) else {
            warn!(capability = name, "unknown capability invoked");
            return format!("{name} error: unknown capability");
        };
        handle.call(args, ctx).await
    }
}

/// Errors produced by capability registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Definition failed validation.
    #[error("invalid capability definition: {reason}")]
    InvalidDefinition {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Name collided with an existing registration.
    #[error("capability `{name}` is already registered")]
    Duplicate {
        /// Name of the offending capability.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "Echo the incoming arguments",
            json!({"type": "object", "properties": {}}),
        )
    }

    #[tokio::test]
    async fn register_and_call_capability() {
        let registry = CapabilityRegistry::new();
        registry
            .register(definition("echo"), |args: Value, _ctx: ToolContext| async move {
                args.to_string()
            })
            .unwrap();

        let out = registry
            .call("echo", json!({"x": 1}), &ToolContext::anonymous())
            .await;
        assert_eq!(out, r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn unknown_capability_returns_error_text() {
        let registry = CapabilityRegistry::new();
        let out = registry
            .call("missing", Value::Null, &ToolContext::anonymous())
            .await;
        assert_eq!(out, "missing error: unknown capability");
    }

    #[tokio::test]
    async fn duplicate_registration_errors() {
        let registry = CapabilityRegistry::new();
        registry
            .register(definition("echo"), |_: Value, _: ToolContext| async move {
                String::new()
            })
            .unwrap();

        let err = registry
            .register(definition("echo"), |_: Value, _: ToolContext| async move {
                String::new()
            })
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, RegistryError::Duplicate { name } if name == "echo"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let registry = CapabilityRegistry::new();
        let err = registry
            .register(definition(" "), |_: Value, _: ToolContext| async move {
                String::new()
            })
            .expect_err("empty name should fail");

        assert!(matches!(err, RegistryError::InvalidDefinition { .. }));
    }

    #[test]
    fn list_exposes_definitions() {
        let registry = CapabilityRegistry::new();
        registry
            .register(definition("echo"), |_: Value, _: ToolContext| async move {
                String::new()
            })
            .unwrap();

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "echo");
        assert_eq!(listed[0].description(), "Echo the incoming arguments");
    }
}
