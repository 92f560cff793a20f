//! The single monitored node (spec §3 "Node state", §6 node management API).
//!
//! Ownership is exclusive to the poller; every other reader takes the read
//! side of the lock (spec §5 "Shared resources").

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct NodeState {
    pub node_id: String,
    pub base_url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    pub healthy: bool,
    pub health_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<JsonValue>,
}

impl NodeState {
    pub fn new(node_id: String, base_url: Url) -> Self {
        Self {
            node_id,
            base_url,
            last_seen: None,
            healthy: false,
            health_score: 100,
            latitude: None,
            longitude: None,
            location_name: None,
            last_snapshot: None,
        }
    }
}

/// Holds the process's single monitored node. Empty until a node is added
/// through the operational API (§6); the poller is a no-op while empty
/// (spec §8: "for all poller ticks with no node configured, no outbound
/// requests are performed").
#[derive(Clone, Default)]
pub struct NodeStore {
    inner: std::sync::Arc<RwLock<Option<NodeState>>>,
}

impl NodeStore {
    pub fn get(&self) -> Option<NodeState> {
        self.inner.read().clone()
    }

    pub fn set(&self, node_id: String, base_url: Url) -> NodeState {
        let state = NodeState::new(node_id, base_url);
        *self.inner.write() = Some(state.clone());
        state
    }

    pub fn remove(&self) -> Option<NodeState> {
        self.inner.write().take()
    }

    /// Applies the poller's update in place; a no-op if the node was removed
    /// concurrently.
    pub fn update(&self, f: impl FnOnce(&mut NodeState)) {
        if let Some(state) = self.inner.write().as_mut() {
            f(state);
        }
    }
}
