//! A2A invocation client — sends one message to a remote agent
//!
//! Orchestration code upstream expects text, so `invoke` never raises:
//! transport and parse failures come back as a failure value whose
//! message is retained for logging.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::A2aError;
use crate::protocol::{Message, SendMessageRequest};
use crate::registry::RemoteAgentRegistry;

/// Per-invocation transport timeouts.
///
/// reqwest has no standalone write timeout; time spent writing counts
/// against `total`.
#[derive(Debug, Clone)]
pub struct InvocationTimeouts {
    /// Overall deadline for the call
    pub total: Duration,
    /// Connection establishment
    pub connect: Duration,
    /// Time between read progress
    pub read: Duration,
    /// Idle pooled connections
    pub pool_idle: Duration,
}

impl Default for InvocationTimeouts {
    fn default() -> Self {
        Self {
            total: Duration::from_secs(120),
            connect: Duration::from_secs(10),
            read: Duration::from_secs(120),
            pool_idle: Duration::from_secs(5),
        }
    }
}

impl InvocationTimeouts {
    /// Timeouts with the given total deadline; the read timeout follows
    /// it, the rest keep their defaults.
    pub fn with_total(total: Duration) -> Self {
        Self {
            total,
            read: total,
            ..Self::default()
        }
    }
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Text extracted from the first text-bearing artifact part
    Text(String),
    /// No text part found; the full response envelope, pretty-printed
    Raw(String),
    /// Transport or parse failure, message retained for logging
    Failed(String),
}

impl InvocationResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Render the result as printable text, whatever the outcome
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Raw(text) => text,
            Self::Failed(message) => format!("Agent invocation failed: {}", message),
        }
    }
}

impl std::fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) | Self::Raw(text) => write!(f, "{}", text),
            Self::Failed(message) => write!(f, "Agent invocation failed: {}", message),
        }
    }
}

/// Client for invoking remote agents registered in a [`RemoteAgentRegistry`]
#[derive(Clone)]
pub struct A2aClient {
    registry: Arc<RemoteAgentRegistry>,
    timeouts: InvocationTimeouts,
}

impl A2aClient {
    pub fn new(registry: Arc<RemoteAgentRegistry>) -> Self {
        Self {
            registry,
            timeouts: InvocationTimeouts::default(),
        }
    }

    /// Override the default timeouts for every call made by this client
    pub fn with_timeouts(registry: Arc<RemoteAgentRegistry>, timeouts: InvocationTimeouts) -> Self {
        Self { registry, timeouts }
    }

    /// Send one user message to the agent at `endpoint` and extract a
    /// textual result.
    ///
    /// Each call opens its own transport session, released on every
    /// exit path.
    pub async fn invoke(&self, endpoint: &str, text: &str) -> InvocationResult {
        let card = match self.registry.card_for(endpoint).await {
            Ok(card) => card,
            Err(e) => {
                warn!("Could not resolve agent card for {}: {}", endpoint, e);
                return InvocationResult::Failed(e.to_string());
            }
        };

        let http = match reqwest::Client::builder()
            .timeout(self.timeouts.total)
            .connect_timeout(self.timeouts.connect)
            .read_timeout(self.timeouts.read)
            .pool_idle_timeout(self.timeouts.pool_idle)
            .build()
        {
            Ok(http) => http,
            Err(e) => return InvocationResult::Failed(format!("failed to build client: {}", e)),
        };

        let target = if card.url.is_empty() {
            endpoint.to_string()
        } else {
            card.url.clone()
        };
        let request = SendMessageRequest::new(Message::user_text(text));
        debug!("Sending message {} to {} ({})", request.id, card.name, target);

        let resp = match http.post(&target).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Invocation transport error for {}: {}", target, e);
                return InvocationResult::Failed(e.to_string());
            }
        };

        if !resp.status().is_success() {
            return InvocationResult::Failed(format!("{}: HTTP {}", target, resp.status()));
        }

        let envelope: Value = match resp.json().await {
            Ok(value) => value,
            Err(e) => {
                warn!("Invocation response parse error for {}: {}", target, e);
                return InvocationResult::Failed(e.to_string());
            }
        };

        match extract_artifact_text(&envelope) {
            Ok(text) => InvocationResult::Text(text),
            // Not fatal: the caller always gets something printable
            Err(e) => {
                debug!("{} from {}; returning serialized envelope", e, target);
                InvocationResult::Raw(
                    serde_json::to_string_pretty(&envelope)
                        .unwrap_or_else(|_| envelope.to_string()),
                )
            }
        }
    }
}

/// Text of the first text-bearing part of the first artifact carrying one
fn extract_artifact_text(envelope: &Value) -> Result<String, A2aError> {
    let artifacts = envelope
        .get("result")
        .and_then(|r| r.get("artifacts"))
        .and_then(|a| a.as_array())
        .ok_or(A2aError::NoExtractableText)?;
    for artifact in artifacts {
        let Some(parts) = artifact.get("parts").and_then(|p| p.as_array()) else {
            continue;
        };
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                return Ok(text.to_string());
            }
        }
    }
    Err(A2aError::NoExtractableText)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_timeouts() {
        let timeouts = InvocationTimeouts::default();
        assert_eq!(timeouts.total, Duration::from_secs(120));
        assert_eq!(timeouts.connect, Duration::from_secs(10));
    }

    #[test]
    fn test_with_total_overrides_read() {
        let timeouts = InvocationTimeouts::with_total(Duration::from_secs(30));
        assert_eq!(timeouts.total, Duration::from_secs(30));
        assert_eq!(timeouts.read, Duration::from_secs(30));
        assert_eq!(timeouts.connect, Duration::from_secs(10));
    }

    #[test]
    fn test_extract_text_happy_path() {
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": "r1",
            "result": {
                "id": "t1",
                "artifacts": [
                    {"name": "response", "parts": [{"kind": "text", "text": "hello"}]}
                ]
            }
        });
        assert_eq!(extract_artifact_text(&envelope).unwrap(), "hello");
    }

    #[test]
    fn test_extract_text_skips_textless_parts() {
        let envelope = json!({
            "result": {
                "artifacts": [
                    {"parts": [{"kind": "data"}]},
                    {"parts": [{"kind": "data"}, {"kind": "text", "text": "second"}]}
                ]
            }
        });
        assert_eq!(extract_artifact_text(&envelope).unwrap(), "second");
    }

    #[test]
    fn test_extract_text_errors_without_artifacts() {
        for envelope in [
            json!({"result": {}}),
            json!({"error": {"code": -32603}}),
            json!({"result": {"artifacts": [{"parts": []}]}}),
        ] {
            assert!(matches!(
                extract_artifact_text(&envelope),
                Err(A2aError::NoExtractableText)
            ));
        }
    }

    #[test]
    fn test_result_into_text() {
        assert_eq!(
            InvocationResult::Text("hi".to_string()).into_text(),
            "hi"
        );
        assert_eq!(
            InvocationResult::Raw("{}".to_string()).into_text(),
            "{}"
        );
        let failed = InvocationResult::Failed("refused".to_string());
        assert!(failed.is_failure());
        assert!(failed.into_text().contains("refused"));
    }

    #[tokio::test]
    async fn test_invoke_unreachable_endpoint_fails_cleanly() {
        let registry = Arc::new(RemoteAgentRegistry::new());
        let client = A2aClient::new(registry);

        let result = client.invoke("http://127.0.0.1:1", "ping").await;
        assert!(result.is_failure());
        assert!(!result.into_text().is_empty());
    }
}
