//! flock-agentd — reference A2A agent server
//!
//! Loads one explicit config, wires the capability registry and a
//! trivial echo runtime into the A2A bridge, and serves. Useful as a
//! fleet test peer and as a template for embedding a real runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flock_a2a::{
    A2aServer, InvocationTimeouts, ListRemoteAgentsTool, RemoteAgentRegistry, SendAgentTaskTool,
};
use flock_core::{AgentConfig, AgentRuntime, CapabilityRegistry, RunEvent, Session};

#[derive(Parser)]
#[command(name = "flock-agentd", about = "Serve a local agent over the A2A protocol")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,
}

/// Placeholder runtime: echoes the prompt and names the capabilities it
/// would have available. Swap in a real runtime when embedding.
struct EchoRuntime {
    app_name: String,
    capabilities: Arc<CapabilityRegistry>,
}

#[async_trait]
impl AgentRuntime for EchoRuntime {
    fn name(&self) -> &str {
        &self.app_name
    }

    async fn run(&self, _session: &Session, input: &str) -> Result<Vec<RunEvent>> {
        let mut names: Vec<String> = self
            .capabilities
            .list()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();

        Ok(vec![
            RunEvent::final_text(format!("[PROMPT]: {}", input)),
            RunEvent::final_text(format!("[CAPABILITIES]: {}", names.join(", "))),
        ])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let registry = Arc::new(RemoteAgentRegistry::new());
    let timeouts = InvocationTimeouts::with_total(Duration::from_secs(config.request_timeout_secs));

    let mut capabilities = CapabilityRegistry::new();
    capabilities.register(Arc::new(ListRemoteAgentsTool::new(registry.clone())));
    capabilities.register(Arc::new(SendAgentTaskTool::new(registry.clone(), timeouts)));

    let runtime = Arc::new(EchoRuntime {
        app_name: config.name.clone(),
        capabilities: Arc::new(capabilities),
    });

    let server = A2aServer::with_registry(&config, runtime, registry).await;
    info!(
        "Starting agent '{}' with {} pre-registered peers",
        config.name,
        config.peers.len()
    );

    server.serve(&config.bind_addr()).await
}
