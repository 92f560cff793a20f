//! `GET|POST|DELETE /api/prometheus/nodes[/id]` — manages the single
//! monitored node (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use url::Url;

use crate::http::HttpError;
use crate::node::NodeState;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub node_id: String,
    pub base_url: Url,
}

pub async fn list_nodes(State(state): State<AppState>) -> Json<Vec<NodeState>> {
    Json(state.node.get().into_iter().collect())
}

pub async fn get_node(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<NodeState>, HttpError> {
    match state.node.get() {
        Some(node) if node.node_id == id => Ok(Json(node)),
        _ => Err(HttpError::not_found().msg("no node with that id is configured")),
    }
}

pub async fn create_node(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> Json<NodeState> {
    let node = state.node.set(request.node_id, request.base_url);
    Json(node)
}

pub async fn delete_node(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, HttpError> {
    match state.node.get() {
        Some(node) if node.node_id == id => {
            state.node.remove();
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(HttpError::not_found().msg("no node with that id is configured")),
    }
}
