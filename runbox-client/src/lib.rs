//! Execution client for the sandboxed runtime.
//!
//! This crate is the only place that knows the broker subject and the JSON
//! envelope exchanged with the runtime. Everything above it deals in
//! [`ExecutionRequest`] values going down and opaque display text coming
//! back: every consumer of execution results treats the outcome as text, so
//! the structured response never leaves this crate.

#![warn(missing_docs, clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use runbox_primitives::{DispatchError, DispatchResult, ExecutionRequest, ExecutionResponse};
use runbox_transport::{BrokerTransport, TransportError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The single well-known request subject used for every execution, fixed for
/// compatibility with the runtime.
pub const EXECUTE_SUBJECT: &str = "sandbox.execute";

/// Request envelope as the runtime expects it on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    public_id: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<&'a [String]>,
}

/// Response envelope as the runtime reports it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    output: String,
    exit_code: i32,
    #[serde(default)]
    error: Option<String>,
}

/// Client that submits execution requests over the shared broker transport.
#[derive(Clone)]
pub struct ExecutionClient {
    transport: Arc<dyn BrokerTransport>,
}

impl ExecutionClient {
    /// Creates a client over the supplied transport handle.
    #[must_use]
    pub fn new(transport: Arc<dyn BrokerTransport>) -> Self {
        Self { transport }
    }

    /// Submits the request and folds the runtime's reply into display text.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Timeout`] when no reply arrives within
    /// `timeout`, [`DispatchError::ServiceUnavailable`] when nothing is
    /// answering the execution subject, and [`DispatchError::Transport`] for
    /// any other transport or envelope failure. The raw transport error type
    /// never reaches callers.
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        timeout: Duration,
    ) -> DispatchResult<String> {
        let wire = WireRequest {
            public_id: request.submission_id().to_string(),
            code: request.code(),
            permissions: request.permissions(),
        };
        let payload = serde_json::to_vec(&wire).map_err(|error| {
            DispatchError::transport(format!("failed to encode execution request: {error}"))
        })?;

        let reply = self
            .transport
            .request(EXECUTE_SUBJECT, Bytes::from(payload), timeout)
            .await
            .map_err(signal_failure)?;

        let wire: WireResponse = serde_json::from_slice(&reply).map_err(|error| {
            DispatchError::transport(format!("malformed execution response: {error}"))
        })?;

        let mut response = ExecutionResponse::new(wire.output, wire.exit_code);
        if let Some(error) = wire.error {
            response = response.with_error(error);
        }

        debug!(
            submission_id = %request.submission_id(),
            exit_code = response.exit_code(),
            "execution reply received"
        );

        Ok(fold(&response))
    }
}

/// Collapses a structured execution response into the single text string the
/// chat protocol carries.
///
/// Rules, in order: start with the output; when an error is present, append
/// it on a new line with an `Error: ` prefix (an error can accompany a zero
/// exit code and must still be surfaced); when the result is still empty and
/// the exit code is nonzero, substitute a synthetic exit-code message.
/// Non-empty output with a nonzero exit code and no error stays as-is.
#[must_use]
pub fn fold(response: &ExecutionResponse) -> String {
    let mut text = response.output().to_owned();

    if let Some(error) = response.error() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("Error: ");
        text.push_str(error);
    }

    if text.is_empty() && response.exit_code() != 0 {
        text = format!("execution finished with exit code {}", response.exit_code());
    }

    text
}

/// Re-signals a transport failure as the unified execution failure.
fn signal_failure(error: TransportError) -> DispatchError {
    match error {
        TransportError::Timeout { timeout } => DispatchError::timeout(timeout),
        TransportError::NoResponders { .. } => DispatchError::ServiceUnavailable,
        TransportError::Connection { reason } => DispatchError::transport(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use runbox_transport::TransportResult;
    use serde_json::{Value, json};

    /// Fake transport that records the submitted payload and replies with a
    /// canned result.
    struct FakeTransport {
        reply: TransportResult<Bytes>,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl FakeTransport {
        fn replying(reply: Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(Bytes::from(reply.to_string())),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: TransportError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(String, Value)> {
            self.requests.lock().expect("requests poisoned").clone()
        }
    }

    #[async_trait]
    impl BrokerTransport for FakeTransport {
        async fn request(
            &self,
            subject: &str,
            payload: Bytes,
            _timeout: Duration,
        ) -> TransportResult<Bytes> {
            let decoded: Value = serde_json::from_slice(&payload).expect("payload is json");
            self.requests
                .lock()
                .expect("requests poisoned")
                .push((subject.to_owned(), decoded));
            match &self.reply {
                Ok(bytes) => Ok(bytes.clone()),
                Err(TransportError::Timeout { timeout }) => {
                    Err(TransportError::timeout(*timeout))
                }
                Err(TransportError::NoResponders { subject }) => {
                    Err(TransportError::no_responders(subject.clone()))
                }
                Err(TransportError::Connection { reason }) => {
                    Err(TransportError::connection(reason.clone()))
                }
            }
        }

        async fn close(&self) {}
    }

    #[test]
    fn fold_orders_output_before_error() {
        let response = ExecutionResponse::new("A", 0).with_error("B");
        let folded = fold(&response);
        let a = folded.find('A').expect("contains output");
        let b = folded.find('B').expect("contains error");
        assert!(a < b);
    }

    #[test]
    fn fold_substitutes_exit_code_when_empty() {
        let response = ExecutionResponse::new("", 2);
        assert_eq!(fold(&response), "execution finished with exit code 2");
    }

    #[test]
    fn fold_passes_plain_output_through() {
        let response = ExecutionResponse::new("ok", 0);
        assert_eq!(fold(&response), "ok");
    }

    #[test]
    fn fold_prefers_output_over_nonzero_exit() {
        let response = ExecutionResponse::new("partial result", 1);
        assert_eq!(fold(&response), "partial result");
    }

    #[test]
    fn fold_surfaces_error_alongside_zero_exit() {
        let response = ExecutionResponse::new("", 0).with_error("fetch failed");
        assert_eq!(fold(&response), "Error: fetch failed");
    }

    #[tokio::test]
    async fn execute_sends_the_wire_envelope() {
        let transport = FakeTransport::replying(json!({"output": "42", "exitCode": 0}));
        let client = ExecutionClient::new(transport.clone());

        let request = ExecutionRequest::new("console.log(42);")
            .with_permissions(vec!["net".to_owned()]);
        let folded = client
            .execute(&request, Duration::from_secs(15))
            .await
            .expect("execution succeeds");

        assert_eq!(folded, "42");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let (subject, envelope) = &sent[0];
        assert_eq!(subject, EXECUTE_SUBJECT);
        assert_eq!(envelope["code"], "console.log(42);");
        assert_eq!(envelope["permissions"], json!(["net"]));
        assert_eq!(
            envelope["publicId"],
            request.submission_id().to_string().as_str()
        );
    }

    #[tokio::test]
    async fn execute_omits_absent_permissions() {
        let transport = FakeTransport::replying(json!({"output": "", "exitCode": 0}));
        let client = ExecutionClient::new(transport.clone());

        let request = ExecutionRequest::new("1 + 1");
        client
            .execute(&request, Duration::from_secs(15))
            .await
            .expect("execution succeeds");

        let sent = transport.sent();
        assert!(sent[0].1.get("permissions").is_none());
    }

    #[tokio::test]
    async fn timeout_carries_the_deadline() {
        let transport =
            FakeTransport::failing(TransportError::timeout(Duration::from_millis(15_000)));
        let client = ExecutionClient::new(transport);

        let err = client
            .execute(&ExecutionRequest::new("while(true){}"), Duration::from_millis(15_000))
            .await
            .expect_err("should time out");

        assert!(matches!(err, DispatchError::Timeout { .. }));
        assert!(err.to_string().contains("15000ms"));
    }

    #[tokio::test]
    async fn missing_responders_signal_the_runtime_is_down() {
        let transport =
            FakeTransport::failing(TransportError::no_responders(EXECUTE_SUBJECT));
        let client = ExecutionClient::new(transport);

        let err = client
            .execute(&ExecutionRequest::new("1"), Duration::from_secs(15))
            .await
            .expect_err("should fail");

        assert!(matches!(err, DispatchError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn malformed_replies_become_transport_errors() {
        let transport = Arc::new(FakeTransport {
            reply: Ok(Bytes::from_static(b"not json")),
            requests: Mutex::new(Vec::new()),
        });
        let client = ExecutionClient::new(transport);

        let err = client
            .execute(&ExecutionRequest::new("1"), Duration::from_secs(15))
            .await
            .expect_err("should fail");

        assert!(matches!(err, DispatchError::Transport { .. }));
        assert!(err.to_string().contains("malformed execution response"));
    }
}
