//! Payloads exchanged with the sandboxed runtime.

use crate::SubmissionId;

/// A single code submission bound for the sandboxed runtime.
///
/// Requests are transient: created for one call, submitted once, and
/// discarded. The submission identifier is minted at construction and never
/// reused.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    submission_id: SubmissionId,
    code: String,
    permissions: Option<Vec<String>>,
}

impl ExecutionRequest {
    /// Creates a request for the supplied source, minting a fresh submission
    /// identifier.
    ///
    /// Callers reject empty code before this layer; the request submits
    /// whatever it is given.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            submission_id: SubmissionId::random(),
            code: code.into(),
            permissions: None,
        }
    }

    /// Attaches the ordered capability names granted to this submission.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Returns the submission identifier.
    #[must_use]
    pub const fn submission_id(&self) -> SubmissionId {
        self.submission_id
    }

    /// Returns the source text to execute.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the granted capability names, if any were attached.
    #[must_use]
    pub fn permissions(&self) -> Option<&[String]> {
        self.permissions.as_deref()
    }
}

/// Outcome reported by the sandboxed runtime for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResponse {
    output: String,
    exit_code: i32,
    error: Option<String>,
}

impl ExecutionResponse {
    /// Creates a response with the supplied output and exit code.
    #[must_use]
    pub fn new(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
            error: None,
        }
    }

    /// Attaches the runtime's error text.
    ///
    /// An error may accompany a zero exit code (partial failure inside an
    /// otherwise successful run) and must still reach the caller.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Returns the captured output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the runtime exit code; zero means the run completed.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns the runtime's error text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_distinct_submission_ids() {
        let a = ExecutionRequest::new("console.log(1);");
        let b = ExecutionRequest::new("console.log(1);");
        assert_ne!(a.submission_id(), b.submission_id());
        assert!(a.permissions().is_none());
    }

    #[test]
    fn carries_permissions_in_order() {
        let request = ExecutionRequest::new("fetch('https://example.com')")
            .with_permissions(vec!["net".to_owned(), "env".to_owned()]);
        assert_eq!(
            request.permissions(),
            Some(&["net".to_owned(), "env".to_owned()][..])
        );
    }

    #[test]
    fn error_rides_along_with_zero_exit() {
        let response = ExecutionResponse::new("partial", 0).with_error("stage two failed");
        assert_eq!(response.exit_code(), 0);
        assert_eq!(response.error(), Some("stage two failed"));
    }
}
