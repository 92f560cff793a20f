//! The operational HTTP surface (spec §6): liveness, Prometheus scrape,
//! metrics-password echo, and single-node management.

pub mod health;
pub mod metrics;
pub mod nodes;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .route("/health", get(health::get_health))
        .route("/metrics", get(metrics::get_metrics))
        .route("/koekjes", get(metrics::get_koekjes))
        .route(
            "/api/prometheus/nodes",
            get(nodes::list_nodes).post(nodes::create_node),
        )
        .route(
            "/api/prometheus/nodes/{id}",
            get(nodes::get_node).delete(nodes::delete_node),
        )
        .with_state(state)
}
