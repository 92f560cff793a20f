//! `POST /default_stream` — viewer playback-id resolution (spec §4.3.2).

use axum::extract::State;

use crate::state::AppState;
use crate::wire::codec::{wildcard_name, DefaultStreamFields};
use crate::wire::event::{Event, EventPayload, Source};

pub async fn handle(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = DefaultStreamFields::parse(&body) else {
        // Short payload: passthrough (spec §4.1 decision table) — an empty
        // body tells the streaming server to fall back to its own default.
        return String::new();
    };

    let resolution = state
        .commodore
        .resolve_playback_id(&fields.playback_id, &fields.viewer_host, fields.request_url.as_deref())
        .await;

    let resolution = match resolution {
        Ok(resolution) if !resolution.internal_name.is_empty() => resolution,
        Ok(_) => return String::new(),
        Err(error) => {
            tracing::warn!(error = format!("{error:#}"), "playback-id resolution failed");
            return String::new();
        }
    };

    let geo = state.geoip.lookup(&fields.viewer_host);

    let mut event = Event::new(
        Source::Webhook,
        EventPayload::StreamView {
            output_type: fields.output_type.unwrap_or_default(),
            geo,
        },
    )
    .with_internal_name(resolution.internal_name.clone())
    .with_playback_id(fields.playback_id.clone());
    if let Some(tenant_id) = resolution.tenant_id {
        event = event.with_tenant_id(tenant_id);
    }
    state.events.enqueue(event);

    wildcard_name(&resolution.internal_name)
}
