//! Externally owned rows consumed through the collaborator stores.

use serde::{Deserialize, Serialize};

/// A persisted user-authored tool, addressed by its public identifier.
///
/// The dispatcher treats stored tools as read-only and fetches them fresh on
/// every invocation so edits made between calls take effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTool {
    public_id: String,
    source_text: String,
}

impl StoredTool {
    /// Creates a stored-tool row.
    #[must_use]
    pub fn new(public_id: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            source_text: source_text.into(),
        }
    }

    /// Returns the public identifier.
    #[must_use]
    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Returns the raw source text.
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }
}

/// The stored agent row, reduced to the fields permission resolution reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentRecord {
    public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permissions: Option<String>,
}

impl AgentRecord {
    /// Creates an agent row with no permission grants.
    #[must_use]
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            permissions: None,
        }
    }

    /// Attaches the raw permission field: a JSON array of capability names.
    ///
    /// The field is stored as opaque text; consumers parse it leniently and
    /// treat malformed content as an empty grant list.
    #[must_use]
    pub fn with_permissions(mut self, raw: impl Into<String>) -> Self {
        self.permissions = Some(raw.into());
        self
    }

    /// Returns the public identifier.
    #[must_use]
    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Returns the raw permission field, if present.
    #[must_use]
    pub fn permissions(&self) -> Option<&str> {
        self.permissions.as_deref()
    }
}
