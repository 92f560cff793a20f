//! `POST /user_new` and `POST /user_end` — viewer session lifecycle
//! (spec §4.3.3).

use axum::extract::State;

use crate::state::AppState;
use crate::wire::codec::{internal_name, UserEndFields, UserNewFields};
use crate::wire::event::{ConnectAction, Event, EventPayload, Source};

pub async fn new(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = UserNewFields::parse(&body) else {
        // Short payload: deny (spec §4.1 decision table).
        return "false".to_owned();
    };

    let geo = state.geoip.lookup(&fields.host);

    let event = Event::new(
        Source::Webhook,
        EventPayload::UserConnection {
            action: ConnectAction::Connect,
            session_id: fields.session_id.clone(),
            geo,
            bytes_up: None,
            bytes_down: None,
            duration_secs: None,
        },
    )
    .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "true".to_owned()
}

pub async fn end(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = UserEndFields::parse(&body) else {
        return "OK".to_owned();
    };

    let event = Event::new(
        Source::Webhook,
        EventPayload::UserConnection {
            action: ConnectAction::Disconnect,
            session_id: fields.session_id.clone(),
            geo: None,
            bytes_up: fields.bytes_up.parse().ok(),
            bytes_down: fields.bytes_down.parse().ok(),
            duration_secs: fields.duration_secs.parse().ok(),
        },
    )
    .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "OK".to_owned()
}
