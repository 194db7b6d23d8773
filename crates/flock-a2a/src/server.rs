//! A2A serving surface
//!
//! Serves the agent's own card at the well-known path and a JSON-RPC
//! message endpoint at the root, delegating execution to the task
//! adapter. Transport framing is axum's problem; this module only
//! produces and consumes envelope content.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use flock_core::{AgentConfig, AgentRuntime};

use crate::executor::{EventQueue, RequestContext, TaskExecutor, apply_event};
use crate::protocol::{
    AGENT_CARD_PATH, AgentCapabilities, AgentCard, INTERNAL_ERROR, INVALID_PARAMS, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, MessageSendParams, PARSE_ERROR, TASK_NOT_FOUND,
};
use crate::registry::RemoteAgentRegistry;
use crate::store::InMemoryTaskStore;

struct ServerState {
    card: AgentCard,
    executor: TaskExecutor,
    store: InMemoryTaskStore,
}

/// A2A server for one local agent
pub struct A2aServer {
    state: Arc<ServerState>,
    registry: Arc<RemoteAgentRegistry>,
}

impl A2aServer {
    /// Build the server: card from config, peers pre-registered into a
    /// fresh remote-agent registry, executor wired to the runtime.
    pub async fn new(config: &AgentConfig, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self::with_registry(config, runtime, Arc::new(RemoteAgentRegistry::new())).await
    }

    /// Like [`A2aServer::new`], but sharing a caller-supplied registry
    /// (so capability handlers see the same peers).
    pub async fn with_registry(
        config: &AgentConfig,
        runtime: Arc<dyn AgentRuntime>,
        registry: Arc<RemoteAgentRegistry>,
    ) -> Self {
        for peer in &config.peers {
            registry.register(peer).await;
        }

        let card = AgentCard {
            name: config.name.clone(),
            description: config.instruction.clone(),
            url: config.public_url(),
            version: "1.0.0".to_string(),
            default_input_modes: vec!["text".to_string(), "text/plain".to_string()],
            default_output_modes: vec!["text".to_string(), "text/plain".to_string()],
            capabilities: AgentCapabilities { streaming: true },
            skills: Vec::new(),
        };

        let executor = TaskExecutor::new(runtime, &config.status_message, &config.artifact_name);

        Self {
            state: Arc::new(ServerState {
                card,
                executor,
                store: InMemoryTaskStore::new(),
            }),
            registry,
        }
    }

    /// The registry holding this server's pre-registered peers, shared
    /// with capability handlers
    pub fn registry(&self) -> Arc<RemoteAgentRegistry> {
        self.registry.clone()
    }

    /// The card this server advertises
    pub fn card(&self) -> &AgentCard {
        &self.state.card
    }

    /// Build the axum router for this server
    pub fn router(&self) -> Router {
        Router::new()
            .route(AGENT_CARD_PATH, get(serve_card))
            .route("/", post(serve_rpc))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind and serve until the process exits
    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("Failed to read bind address")?;
        info!("A2A server '{}' listening on {}", self.state.card.name, addr);
        info!("Agent card served at http://{}{}", addr, AGENT_CARD_PATH);

        axum::serve(listener, self.router())
            .await
            .context("A2A server terminated")?;
        Ok(())
    }
}

async fn serve_card(State(state): State<Arc<ServerState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn serve_rpc(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> Json<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid JSON-RPC request: {}", e);
            return Json(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let id = request.id.clone().unwrap_or(Value::Null);
    Json(dispatch(&state, id, &request.method, request.params).await)
}

async fn dispatch(state: &ServerState, id: Value, method: &str, params: Value) -> JsonRpcResponse {
    match method {
        "message/send" => on_message_send(state, id, params).await,
        "tasks/get" => on_task_get(state, id, params).await,
        "tasks/cancel" => on_task_cancel(state, id, params).await,
        other => {
            warn!("Unknown JSON-RPC method: {}", other);
            JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            )
        }
    }
}

async fn on_message_send(state: &ServerState, id: Value, params: Value) -> JsonRpcResponse {
    let params: MessageSendParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
        }
    };

    // Resume an existing task when the message references one
    let current_task = match &params.message.task_id {
        Some(task_id) => state.store.get(task_id).await,
        None => None,
    };

    let ctx = RequestContext::new(params.message, current_task);
    let (queue, mut rx) = EventQueue::unbounded();
    let mut task = state.executor.execute(ctx, queue).await;

    // The executor has finished; fold its published events into the record
    while let Ok(event) = rx.try_recv() {
        apply_event(&mut task, &event);
    }
    state.store.save(task.clone()).await;

    match serde_json::to_value(&task) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
    }
}

async fn on_task_get(state: &ServerState, id: Value, params: Value) -> JsonRpcResponse {
    let Some(task_id) = params.get("id").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing 'id' parameter".to_string());
    };

    match state.store.get(task_id).await {
        Some(task) => match serde_json::to_value(&task) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        },
        None => JsonRpcResponse::error(id, TASK_NOT_FOUND, format!("Unknown task: {}", task_id)),
    }
}

async fn on_task_cancel(state: &ServerState, id: Value, params: Value) -> JsonRpcResponse {
    let Some(task_id) = params.get("id").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing 'id' parameter".to_string());
    };

    state.executor.cancel(task_id).await;

    match state.store.get(task_id).await {
        Some(task) => match serde_json::to_value(&task) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        },
        None => JsonRpcResponse::error(id, TASK_NOT_FOUND, format!("Unknown task: {}", task_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use flock_core::{RunEvent, Session};

    struct EchoRuntime;

    #[async_trait]
    impl AgentRuntime for EchoRuntime {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, _session: &Session, input: &str) -> Result<Vec<RunEvent>> {
            Ok(vec![RunEvent::final_text(input.to_string())])
        }
    }

    fn test_config() -> AgentConfig {
        AgentConfig {
            name: "tester".to_string(),
            instruction: "Echoes input".to_string(),
            peers: vec![
                "http://localhost:8001/".to_string(),
                "http://localhost:8001".to_string(),
            ],
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_card_built_from_config() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;
        let card = server.card();
        assert_eq!(card.name, "tester");
        assert_eq!(card.description, "Echoes input");
        assert!(card.capabilities.streaming);
        assert_eq!(card.url, "http://127.0.0.1:9999/");
    }

    #[tokio::test]
    async fn test_peers_preregistered_once() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;
        // Both peer spellings collapse to one registry key
        assert_eq!(server.registry().len().await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;
        let response = dispatch(
            &server.state,
            serde_json::json!(1),
            "tasks/resubscribe",
            Value::Null,
        )
        .await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_task_get_missing_id() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;
        let response = dispatch(
            &server.state,
            serde_json::json!(1),
            "tasks/get",
            serde_json::json!({}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_message_send_then_task_get() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;

        let params = serde_json::json!({
            "message": {
                "role": "user",
                "parts": [{"kind": "text", "text": "hello"}],
                "messageId": "m1"
            }
        });
        let response = dispatch(&server.state, serde_json::json!(1), "message/send", params).await;
        let task = response.result.unwrap();
        assert_eq!(task["status"]["state"], "completed");
        assert_eq!(task["artifacts"][0]["parts"][0]["text"], "hello");

        let task_id = task["id"].as_str().unwrap();
        let fetched = dispatch(
            &server.state,
            serde_json::json!(2),
            "tasks/get",
            serde_json::json!({"id": task_id}),
        )
        .await;
        assert_eq!(fetched.result.unwrap()["status"]["state"], "completed");
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let server = A2aServer::new(&test_config(), Arc::new(EchoRuntime)).await;
        let response = dispatch(
            &server.state,
            serde_json::json!(1),
            "tasks/cancel",
            serde_json::json!({"id": "ghost"}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, TASK_NOT_FOUND);
    }
}
