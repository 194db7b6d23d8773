//! Session service — one session per task context
//!
//! In-memory only; sessions live for the process lifetime. The task
//! adapter keys sessions by the task's context id so a resumed task
//! lands back in its conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A single conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Manages all active sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    /// Create an empty session manager
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session, or return the existing one for this id.
    ///
    /// Idempotent: a task resumed under the same context id reuses its
    /// original session.
    pub async fn create_session(&self, app_name: &str, user_id: &str, session_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(session_id) {
            debug!("Reusing session {}", session_id);
            return existing.clone();
        }

        let session = Session {
            id: session_id.to_string(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        debug!("Created session {} for app {}", session_id, app_name);
        sessions.insert(session_id.to_string(), session.clone());
        session
    }

    /// Get a session by id
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Number of live sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let manager = SessionManager::new();
        let session = manager.create_session("app", "user-1", "ctx-1").await;
        assert_eq!(session.id, "ctx-1");
        assert_eq!(session.user_id, "user-1");

        let fetched = manager.get("ctx-1").await.unwrap();
        assert_eq!(fetched.app_name, "app");
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let manager = SessionManager::new();
        let first = manager.create_session("app", "user-1", "ctx-1").await;
        let second = manager.create_session("app", "other-user", "ctx-1").await;

        // Same session comes back; the original owner wins
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.user_id, "user-1");
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let manager = SessionManager::new();
        assert!(manager.get("missing").await.is_none());
    }
}
