//! Typed errors for the A2A bridge

use thiserror::Error;

/// Errors raised by the registry, client, and executor
#[derive(Debug, Error)]
pub enum A2aError {
    /// Card fetch or invocation transport failed
    #[error("agent endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    /// Fetched card does not parse into the expected shape. Never cached.
    #[error("malformed agent card from {endpoint}: {reason}")]
    MalformedDescriptor { endpoint: String, reason: String },

    /// Response carried no text part anywhere. Callers fall back to the
    /// serialized envelope instead of failing.
    #[error("no extractable text in response")]
    NoExtractableText,

    /// The wrapped agent runtime failed during a run
    #[error("agent execution failed: {0}")]
    AgentExecutionFailure(String),
}
