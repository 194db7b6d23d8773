//! Process configuration
//!
//! One explicit struct, built once at startup and threaded through
//! constructors. No environment sniffing at import time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one agent process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name advertised on the agent card
    pub name: String,
    /// Identifier of the underlying model the runtime wraps
    #[serde(default)]
    pub model: String,
    /// Instruction/system text handed to the runtime
    #[serde(default)]
    pub instruction: String,
    /// Peer agent endpoints pre-registered at startup
    #[serde(default)]
    pub peers: Vec<String>,
    /// Bind host for the serving surface
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for the serving surface
    #[serde(default = "default_port")]
    pub port: u16,
    /// Default total timeout for outbound invocations, in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Progress text published while a task is being worked
    #[serde(default = "default_status_message")]
    pub status_message: String,
    /// Name given to the response artifact
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_status_message() -> String {
    "Processing request...".to_string()
}

fn default_artifact_name() -> String {
    "response".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "flock-agent".to_string(),
            model: String::new(),
            instruction: String::new(),
            peers: Vec::new(),
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_timeout_secs(),
            status_message: default_status_message(),
            artifact_name: default_artifact_name(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Address the serving surface binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL peers reach this agent at
    pub fn public_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}
