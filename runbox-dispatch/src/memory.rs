//! Map-backed collaborator stores for demos and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use runbox_primitives::{AgentRecord, StoredTool};

use crate::dispatcher::{AgentStore, ToolStore};

/// Tool store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryToolStore {
    inner: RwLock<HashMap<String, StoredTool>>,
}

impl InMemoryToolStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a tool, keyed by its public identifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, tool: StoredTool) {
        let mut inner = self.inner.write().expect("tool store poisoned");
        inner.insert(tool.public_id().to_owned(), tool);
    }

    /// Removes a tool, returning it when present.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, public_id: &str) -> Option<StoredTool> {
        let mut inner = self.inner.write().expect("tool store poisoned");
        inner.remove(public_id)
    }
}

#[async_trait]
impl ToolStore for InMemoryToolStore {
    async fn get_by_public_id(&self, public_id: &str) -> Option<StoredTool> {
        let inner = self.inner.read().ok()?;
        inner.get(public_id).cloned()
    }
}

/// Agent store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryAgentStore {
    inner: RwLock<HashMap<String, AgentRecord>>,
}

impl InMemoryAgentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an agent row, keyed by its public identifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, record: AgentRecord) {
        let mut inner = self.inner.write().expect("agent store poisoned");
        inner.insert(record.public_id().to_owned(), record);
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get_by_public_id(&self, public_id: &str) -> Option<AgentRecord> {
        let inner = self.inner.read().ok()?;
        inner.get(public_id).cloned()
    }
}
