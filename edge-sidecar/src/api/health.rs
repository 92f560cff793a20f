//! `GET /health` — liveness (spec §6).

use axum::extract::State;

use crate::state::AppState;

pub async fn get_health(State(_state): State<AppState>) -> &'static str {
    "edge-sidecar is alive"
}
