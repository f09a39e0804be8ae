//! Submission identifier type.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DispatchError;

/// Unique identifier for a single code submission.
///
/// A fresh identifier is generated for every execution request and never
/// reused; the runtime correlates its run records against it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Generates a random submission identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for SubmissionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for SubmissionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<SubmissionId> for Uuid {
    fn from(value: SubmissionId) -> Self {
        value.0
    }
}

impl FromStr for SubmissionId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s)
            .map_err(|error| DispatchError::validation(format!("invalid submission id: {error}")))?;
        Ok(Self::from_uuid(uuid))
    }
}
