//! The trigger/webhook handler set (spec §4.3): synchronous HTTP endpoints
//! whose response body doubles as the admission/routing decision.

mod default_stream;
mod lifecycle;
mod push_rewrite;
mod user;
mod util;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .route("/webhooks/mist/push_rewrite", post(push_rewrite::handle))
        .route("/default_stream", post(default_stream::handle))
        .route("/push_end", post(lifecycle::push_end))
        .route("/push_out_start", post(lifecycle::push_out_start))
        .route("/stream_buffer", post(lifecycle::stream_buffer))
        .route("/stream_end", post(lifecycle::stream_end))
        .route("/user_new", post(user::new))
        .route("/user_end", post(user::end))
        .route("/live_track_list", post(lifecycle::live_track_list))
        .route("/live_bandwidth", post(lifecycle::live_bandwidth))
        .route("/recording_end", post(lifecycle::recording_end))
        .with_state(state)
}
