//! Agent runtime seam
//!
//! The actual reasoning loop lives in an external framework. Flock only
//! needs to hand it an input inside a session and consume the execution
//! events it emits, so the boundary is a single trait.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::session::Session;

/// One event emitted while the wrapped agent works on an input
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// The agent called a tool/function. Logged by the consumer, never
    /// surfaced as output.
    ToolCall { name: String, input: Value },
    /// A final response. Text parts are concatenated by the consumer in
    /// emission order.
    FinalResponse { parts: Vec<String> },
}

impl RunEvent {
    /// Convenience constructor for a single-part final response
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::FinalResponse {
            parts: vec![text.into()],
        }
    }
}

/// The wrapped agent framework, reduced to what the task adapter needs
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Application name, used for session bookkeeping
    fn name(&self) -> &str;

    /// Run the agent against one user input inside the given session,
    /// returning the execution events in emission order.
    async fn run(&self, session: &Session, input: &str) -> Result<Vec<RunEvent>>;
}
