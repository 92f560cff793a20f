//! `GET /metrics` (Prometheus scrape) and `GET /koekjes` (metrics-password
//! echo for scrapers) — spec §6.

use axum::extract::State;

use crate::http::HttpError;
use crate::state::AppState;

pub async fn get_metrics(State(state): State<AppState>) -> Result<String, HttpError> {
    state.metrics.encode().map_err(HttpError::internal().err())
}

pub async fn get_koekjes(State(state): State<AppState>) -> String {
    state.conf.mist_password.clone()
}
