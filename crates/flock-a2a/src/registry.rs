//! Remote-agent registry with lazy card caching
//!
//! Tracks peer agent endpoints and their agent cards. A registered
//! endpoint starts out unresolved (known, card not yet fetched) and is
//! populated on the first successful fetch. Entries never expire within
//! the process lifetime, so a populated card can go stale if the peer
//! redeploys.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::A2aError;
use crate::protocol::{AGENT_CARD_PATH, AgentCard};

/// Strip the trailing slash so `http://h:1` and `http://h:1/` share a key
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Canonical card URL for an endpoint
pub(crate) fn agent_card_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), AGENT_CARD_PATH)
}

/// Registry of known remote agents and their cached cards
pub struct RemoteAgentRegistry {
    // None = registered but card not yet fetched
    agents: RwLock<HashMap<String, Option<AgentCard>>>,
    http: reqwest::Client,
}

impl RemoteAgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Register a remote agent endpoint. Idempotent; re-registering a
    /// known endpoint keeps its cached card.
    pub async fn register(&self, endpoint: &str) {
        let key = normalize_endpoint(endpoint);
        let mut agents = self.agents.write().await;
        if !agents.contains_key(&key) {
            debug!("Registered remote agent {}", key);
            agents.insert(key, None);
        }
    }

    /// Remove a remote agent. No-op for unknown endpoints.
    pub async fn deregister(&self, endpoint: &str) {
        let key = normalize_endpoint(endpoint);
        if self.agents.write().await.remove(&key).is_some() {
            debug!("Deregistered remote agent {}", key);
        }
    }

    /// Registered endpoint keys, resolved or not
    pub async fn endpoints(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.agents.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registered endpoints
    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    /// Check whether any endpoints are registered
    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    /// List the cards of all registered agents, fetching any that are
    /// not yet cached.
    ///
    /// Unreachable peers are logged and omitted; a partial list is the
    /// expected outcome in a fleet where some agents may be down.
    pub async fn list(&self) -> Vec<AgentCard> {
        let snapshot: Vec<(String, Option<AgentCard>)> = {
            let agents = self.agents.read().await;
            agents.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut cards = Vec::with_capacity(snapshot.len());
        for (endpoint, cached) in snapshot {
            if let Some(card) = cached {
                cards.push(card);
                continue;
            }
            match self.fetch_card(&endpoint).await {
                Ok(card) => {
                    self.populate(&endpoint, &card).await;
                    cards.push(card);
                }
                Err(e) => {
                    warn!("Failed to fetch agent card from {}: {}", endpoint, e);
                }
            }
        }
        cards
    }

    /// Card for one endpoint: cached if available, fetched otherwise.
    ///
    /// The cache is only populated for registered endpoints; calling
    /// this with an unknown endpoint fetches without registering it.
    pub async fn card_for(&self, endpoint: &str) -> Result<AgentCard, A2aError> {
        let key = normalize_endpoint(endpoint);
        if let Some(Some(card)) = self.agents.read().await.get(&key) {
            return Ok(card.clone());
        }

        let card = self.fetch_card(&key).await?;
        self.populate(&key, &card).await;
        Ok(card)
    }

    /// Fetch and parse a card from the well-known path
    async fn fetch_card(&self, endpoint: &str) -> Result<AgentCard, A2aError> {
        let url = agent_card_url(endpoint);
        debug!("Fetching agent card from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| A2aError::EndpointUnreachable(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(A2aError::EndpointUnreachable(format!(
                "{}: HTTP {}",
                url,
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| A2aError::EndpointUnreachable(format!("{}: {}", url, e)))?;

        // A card that fails to parse is never cached as valid
        let card: AgentCard =
            serde_json::from_str(&body).map_err(|e| A2aError::MalformedDescriptor {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "Fetched agent card: {} ({} skills)",
            card.name,
            card.skills.len()
        );
        Ok(card)
    }

    /// Store a fetched card, but only under a still-registered key
    async fn populate(&self, key: &str, card: &AgentCard) {
        let mut agents = self.agents.write().await;
        if let Some(slot) = agents.get_mut(key) {
            *slot = Some(card.clone());
        }
    }
}

impl Default for RemoteAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
