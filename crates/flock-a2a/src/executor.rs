//! Task execution adapter — drives one agent run per inbound task
//!
//! Maps a conversational turn onto the task lifecycle: publish the
//! accepted task, move it to working, run the wrapped runtime inside a
//! session, then publish the response artifact and the terminal state.
//! Runtime failures never escape `execute`; they become a terminal
//! `failed` status so the task is never left looking stuck.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use flock_core::{AgentRuntime, RunEvent, SessionManager};

use crate::error::A2aError;
use crate::protocol::{Artifact, Message, Part, Task, TaskState, TaskStatus};

/// Fixed service identity the adapter runs sessions under
const SERVICE_USER_ID: &str = "a2a-user";

/// An event published while a task executes
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// Initial task record, published before any work starts
    Submitted(Task),
    /// Status transition with optional progress message
    Status {
        task_id: String,
        state: TaskState,
        message: Option<Message>,
        is_final: bool,
    },
    /// A produced artifact
    Artifact { task_id: String, artifact: Artifact },
}

/// Sending half of a task's event stream
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl EventQueue {
    /// Create a queue and its receiving half
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event; a closed receiver is logged, not fatal
    pub fn enqueue(&self, event: TaskEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event queue receiver dropped; event discarded");
        }
    }
}

/// Publishes lifecycle events for one task
pub struct TaskUpdater {
    queue: EventQueue,
    task_id: String,
    context_id: String,
}

impl TaskUpdater {
    pub fn new(queue: EventQueue, task_id: &str, context_id: &str) -> Self {
        Self {
            queue,
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
        }
    }

    /// Publish a status transition carrying progress text
    pub fn update_status(&self, state: TaskState, text: Option<&str>, is_final: bool) {
        let message = text.map(|t| Message::agent_text(t, &self.context_id, &self.task_id));
        self.queue.enqueue(TaskEvent::Status {
            task_id: self.task_id.clone(),
            state,
            message,
            is_final,
        });
    }

    /// Publish a named artifact
    pub fn add_artifact(&self, parts: Vec<Part>, name: &str) {
        self.queue.enqueue(TaskEvent::Artifact {
            task_id: self.task_id.clone(),
            artifact: Artifact {
                artifact_id: Uuid::new_v4().simple().to_string(),
                name: Some(name.to_string()),
                parts,
            },
        });
    }

    /// Publish the terminal completed state
    pub fn complete(&self) {
        self.update_status(TaskState::Completed, None, true);
    }
}

/// Inbound request context handed to the executor
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub message: Message,
    pub current_task: Option<Task>,
}

impl RequestContext {
    pub fn new(message: Message, current_task: Option<Task>) -> Self {
        Self {
            message,
            current_task,
        }
    }

    /// Extracted user input text
    pub fn user_input(&self) -> String {
        self.message.text_content()
    }
}

/// Fold one published event into a task record.
///
/// Terminal states are final: status updates after completed/failed are
/// dropped with a warning.
pub fn apply_event(task: &mut Task, event: &TaskEvent) {
    match event {
        TaskEvent::Submitted(initial) => *task = initial.clone(),
        TaskEvent::Status { state, message, .. } => {
            if task.status.state.is_terminal() {
                warn!(
                    "Ignoring status update {} for task {} already in terminal state {}",
                    state, task.id, task.status.state
                );
                return;
            }
            task.status = TaskStatus {
                state: *state,
                message: message.clone(),
                timestamp: Utc::now(),
            };
        }
        TaskEvent::Artifact { artifact, .. } => task.artifacts.push(artifact.clone()),
    }
}

/// Executes inbound tasks against the wrapped agent runtime
pub struct TaskExecutor {
    runtime: Arc<dyn AgentRuntime>,
    sessions: SessionManager,
    status_message: String,
    artifact_name: String,
    cancellations: Mutex<HashMap<String, CancellationToken>>,
}

impl TaskExecutor {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        status_message: impl Into<String>,
        artifact_name: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            sessions: SessionManager::new(),
            status_message: status_message.into(),
            artifact_name: artifact_name.into(),
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    /// Execute one inbound request to its terminal state, publishing
    /// lifecycle events on `queue`. Never returns an error: failures end
    /// as a terminal `failed` status on the event stream.
    pub async fn execute(&self, ctx: RequestContext, queue: EventQueue) -> Task {
        let query = ctx.user_input();
        let task = ctx
            .current_task
            .clone()
            .unwrap_or_else(|| Task::for_message(&ctx.message));

        // Subscribers observe "task accepted" before any work starts
        queue.enqueue(TaskEvent::Submitted(task.clone()));
        let updater = TaskUpdater::new(queue, &task.id, &task.context_id);

        let token = CancellationToken::new();
        self.cancellations
            .lock()
            .await
            .insert(task.id.clone(), token.clone());

        let outcome = self.run_task(&task, &query, &updater, &token).await;
        self.cancellations.lock().await.remove(&task.id);

        if let Err(e) = outcome {
            warn!("Task {} failed: {}", task.id, e);
            let text = format!("Error: {}", e);
            updater.update_status(TaskState::Failed, Some(text.as_str()), true);
        }
        task
    }

    /// Request cooperative cancellation of an in-flight task. Unknown
    /// ids are a logged no-op.
    pub async fn cancel(&self, task_id: &str) {
        match self.cancellations.lock().await.get(task_id) {
            Some(token) => {
                info!("Cancelling task {}", task_id);
                token.cancel();
            }
            None => debug!("Cancel requested for unknown or finished task {}", task_id),
        }
    }

    async fn run_task(
        &self,
        task: &Task,
        query: &str,
        updater: &TaskUpdater,
        token: &CancellationToken,
    ) -> Result<(), A2aError> {
        updater.update_status(TaskState::Working, Some(self.status_message.as_str()), false);

        // Session id = the task's context id, so resumed tasks share state
        let session = self
            .sessions
            .create_session(self.runtime.name(), SERVICE_USER_ID, &task.context_id)
            .await;

        let events = tokio::select! {
            _ = token.cancelled() => {
                return Err(A2aError::AgentExecutionFailure("task cancelled".to_string()));
            }
            result = self.runtime.run(&session, query) => {
                result.map_err(|e| A2aError::AgentExecutionFailure(e.to_string()))?
            }
        };

        let mut response_parts = Vec::new();
        for event in events {
            match event {
                RunEvent::ToolCall { name, input } => {
                    // Logged only; tool calls are handled inside the runtime
                    info!("Task {} tool call: {} {}", task.id, name, input);
                }
                RunEvent::FinalResponse { parts } => response_parts.extend(parts),
            }
        }

        let response_text = response_parts.join("\n");
        updater.add_artifact(vec![Part::text(response_text)], &self.artifact_name);
        updater.complete();
        Ok(())
    }
}
