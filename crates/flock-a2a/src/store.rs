//! In-memory task store
//!
//! Backs `tasks/get` and cancel lookups. Tasks live for the process
//! lifetime only.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::protocol::Task;

/// Process-local task store
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a task record
    pub async fn save(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    /// Fetch a task by id
    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Number of stored tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Check whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}
