//! Capability registry — named handlers behind one invocation interface
//!
//! Capabilities the wrapped agent can call (listing peers, delegating
//! tasks, anything the embedder adds) are registered once at startup and
//! resolved by name. No runtime-attached functions.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A single named capability
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn invoke(&self, args: Value) -> Result<String>;
}

/// Registry of capabilities, populated at construction time
pub struct CapabilityRegistry {
    handlers: HashMap<Arc<str>, Arc<dyn CapabilityHandler>>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a capability handler
    pub fn register(&mut self, handler: Arc<dyn CapabilityHandler>) {
        let name: Arc<str> = Arc::from(handler.name());
        debug!("Registering capability: {}", name);
        self.handlers.insert(name, handler);
    }

    /// Get a handler by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn CapabilityHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Invoke a capability by name
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| anyhow!("Unknown capability: {}", name))?;

        match handler.invoke(args).await {
            Ok(result) => {
                debug!("Capability {} succeeded", name);
                Ok(result)
            }
            Err(e) => {
                warn!("Capability {} failed: {}", name, e);
                Err(e)
            }
        }
    }

    /// Names and descriptions of all registered capabilities
    pub fn list(&self) -> Vec<(String, String)> {
        self.handlers
            .values()
            .map(|h| (h.name().to_string(), h.description().to_string()))
            .collect()
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCapability;

    #[async_trait]
    impl CapabilityHandler for EchoCapability {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Returns its input unchanged"
        }

        async fn invoke(&self, args: Value) -> Result<String> {
            Ok(args
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string())
        }
    }

    struct FailingCapability;

    #[async_trait]
    impl CapabilityHandler for FailingCapability {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn invoke(&self, _args: Value) -> Result<String> {
            Err(anyhow!("intentional failure"))
        }
    }

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability));

        assert_eq!(registry.len(), 1);
        let result = registry
            .invoke("echo", serde_json::json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(result, "hi");
    }

    #[tokio::test]
    async fn test_unknown_capability() {
        let registry = CapabilityRegistry::new();
        let result = registry.invoke("missing", serde_json::json!({})).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown capability"));
    }

    #[tokio::test]
    async fn test_failing_capability() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(FailingCapability));

        let result = registry.invoke("failing", serde_json::json!({})).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("intentional failure")
        );
    }

    #[test]
    fn test_list_and_overwrite() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability));
        registry.register(Arc::new(EchoCapability));

        assert_eq!(registry.len(), 1);
        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "echo");
    }

    #[test]
    fn test_default_is_empty() {
        let registry = CapabilityRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_none());
    }
}
