//! Capability handlers exposing the A2A client to the wrapped agent
//!
//! These are the two peer-facing capabilities the local agent gets at
//! startup: listing known remote agents and delegating a task to one.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use flock_core::CapabilityHandler;

use crate::client::{A2aClient, InvocationTimeouts};
use crate::registry::RemoteAgentRegistry;

/// Lists the cards of all registered remote agents
pub struct ListRemoteAgentsTool {
    registry: Arc<RemoteAgentRegistry>,
}

impl ListRemoteAgentsTool {
    pub fn new(registry: Arc<RemoteAgentRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CapabilityHandler for ListRemoteAgentsTool {
    fn name(&self) -> &str {
        "list_remote_agents"
    }

    fn description(&self) -> &str {
        "List the known remote agents and their advertised capabilities. \
         Agents that cannot be reached are omitted."
    }

    async fn invoke(&self, _args: Value) -> Result<String> {
        let cards = self.registry.list().await;
        debug!("Listing {} remote agents", cards.len());
        serde_json::to_string_pretty(&cards).map_err(Into::into)
    }
}

/// Sends one message to a remote agent and returns its textual result
pub struct SendAgentTaskTool {
    client: A2aClient,
}

impl SendAgentTaskTool {
    pub fn new(registry: Arc<RemoteAgentRegistry>, timeouts: InvocationTimeouts) -> Self {
        Self {
            client: A2aClient::with_timeouts(registry, timeouts),
        }
    }
}

#[async_trait]
impl CapabilityHandler for SendAgentTaskTool {
    fn name(&self) -> &str {
        "send_agent_task"
    }

    fn description(&self) -> &str {
        "Send a task to a remote agent at the given endpoint and return \
         the text of its response."
    }

    async fn invoke(&self, args: Value) -> Result<String> {
        let endpoint = args
            .get("endpoint")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing 'endpoint' parameter"))?;
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing 'message' parameter"))?;

        // Truncate on a char boundary; byte offsets can land inside a
        // multibyte character
        let preview = message
            .char_indices()
            .nth(100)
            .map_or(message, |(i, _)| &message[..i]);
        debug!("Delegating to {}: {}", endpoint, preview);

        // Failures come back as printable text so the orchestrating
        // agent keeps working with whatever it gets
        let result = self.client.invoke(endpoint, message).await;
        Ok(result.into_text())
    }
}
