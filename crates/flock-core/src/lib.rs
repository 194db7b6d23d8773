//! flock-core — shared building blocks for Flock agents
//!
//! Holds the process configuration, the in-memory session service, the
//! seam to the wrapped agent runtime, and the capability-handler registry
//! that agent-facing tools plug into at startup.

pub mod capability;
pub mod config;
pub mod runtime;
pub mod session;

pub use capability::{CapabilityHandler, CapabilityRegistry};
pub use config::AgentConfig;
pub use runtime::{AgentRuntime, RunEvent};
pub use session::{Session, SessionManager};
