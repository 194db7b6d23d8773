//! A2A (Agent-to-Agent) protocol bridge for Flock
//!
//! Wraps the wire protocol on both sides: a registry/cache of remote
//! agents plus an invocation client for outbound calls, and a task
//! executor plus JSON-RPC serving surface for inbound ones.

pub mod client;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod store;
pub mod tool;

pub use client::{A2aClient, InvocationResult, InvocationTimeouts};
pub use error::A2aError;
pub use executor::{EventQueue, RequestContext, TaskEvent, TaskExecutor, TaskUpdater};
pub use protocol::{AgentCard, Artifact, Message, Part, Role, Task, TaskState, TaskStatus};
pub use registry::RemoteAgentRegistry;
pub use server::A2aServer;
pub use store::InMemoryTaskStore;
pub use tool::{ListRemoteAgentsTool, SendAgentTaskTool};
