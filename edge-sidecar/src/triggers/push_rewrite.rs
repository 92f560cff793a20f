//! `POST /webhooks/mist/push_rewrite` — admission (spec §4.3.1).

use axum::extract::State;

use super::util::protocol_from_scheme;
use crate::state::AppState;
use crate::wire::codec::{wildcard_name, PushRewriteFields};
use crate::wire::event::{Event, EventPayload, Source};

pub async fn handle(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = PushRewriteFields::parse(&body) else {
        // Short payload: deny (spec §4.1 decision table).
        return String::new();
    };

    let validation = state
        .commodore
        .validate_stream_key(&fields.push_url, &fields.host, &fields.stream_name)
        .await;

    let validation = match validation {
        Ok(validation) => validation,
        Err(error) => {
            tracing::warn!(error = format!("{error:#}"), "stream-key validation failed");
            return String::new();
        }
    };

    if !validation.valid {
        return String::new();
    }

    let wildcard = wildcard_name(&validation.internal_name);
    let protocol = protocol_from_scheme(&fields.push_url);

    let mut event = Event::new(Source::Webhook, EventPayload::StreamIngest { protocol })
        .with_internal_name(validation.internal_name.clone());
    if let Some(user_id) = validation.user_id {
        event = event.with_user_id(user_id);
    }
    if let Some(tenant_id) = validation.tenant_id {
        event = event.with_tenant_id(tenant_id);
    }
    state.events.enqueue(event);

    wildcard
}
