//! The fixed-response lifecycle/telemetry webhooks (spec §4.3.4): push end,
//! push-out start, stream buffer, stream end, live track list, live
//! bandwidth, recording end. Each emits one event and replies with a fixed
//! acknowledgement, except push-out-start which echoes its target.

use axum::extract::State;

use crate::health::{build_track_summary, derive_stream_health};
use crate::state::AppState;
use crate::wire::codec::{
    internal_name, BufferState, LiveBandwidthFields, LiveTrackListFields, PushEndFields, PushOutStartFields,
    RecordingEndFields, StreamBufferFields, StreamDetails, StreamEndFields,
};
use crate::wire::event::{Event, EventPayload, LifecycleState, PushStage, Source};

pub async fn push_end(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = PushEndFields::parse(&body) else {
        // Short payload: ack, drop event (spec §4.1 decision table).
        return "OK".to_owned();
    };

    let event = Event::new(
        Source::Webhook,
        EventPayload::PushLifecycle {
            stage: PushStage::End,
            target: fields.target.clone(),
            reason: Some(fields.reason.clone()).filter(|r| !r.is_empty()),
        },
    )
    .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "OK".to_owned()
}

pub async fn push_out_start(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = PushOutStartFields::parse(&body) else {
        // Short payload: abort (empty) (spec §4.1 decision table).
        return String::new();
    };

    let event = Event::new(
        Source::Webhook,
        EventPayload::PushLifecycle {
            stage: PushStage::Start,
            target: fields.target.clone(),
            reason: None,
        },
    )
    .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    // Passthrough: the requested target is echoed verbatim (spec §9 open
    // question — rewrite is an explicit non-goal).
    fields.target
}

pub async fn stream_buffer(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = StreamBufferFields::parse(&body) else {
        // Short payload: ack, drop event (spec §4.1 decision table).
        return "OK".to_owned();
    };

    let buffer_state = BufferState::parse(&fields.state);
    let details = fields.details.as_deref().and_then(StreamDetails::parse);

    let (has_issues, health_score, quality_tier, tracks) = match &details {
        Some(details) => {
            let health = derive_stream_health(details);
            (health.has_issues, health.health_score, health.quality_tier, health.tracks)
        }
        None => (false, 100, None, Vec::new()),
    };

    let internal = internal_name(&fields.stream_name).to_owned();

    let event = Event::new(
        Source::Webhook,
        EventPayload::StreamLifecycle {
            state: LifecycleState::Live,
            has_issues,
            health_score,
            quality_tier,
            tracks,
        },
    )
    .with_internal_name(internal.clone());
    state.events.enqueue(event);

    let is_healthy = buffer_state.is_healthy();
    if let Err(error) = state.foghorn.send_stream_health(&internal, is_healthy).await {
        tracing::warn!(error = format!("{error:#}"), internal_name = internal, "stream health update failed");
    }

    "OK".to_owned()
}

pub async fn stream_end(State(state): State<AppState>, body: String) -> String {
    // Short payload: ack, best effort (spec §4.1 decision table) — we still
    // return "OK" even when the body can't be parsed.
    let Some(fields) = StreamEndFields::parse(&body) else {
        return "OK".to_owned();
    };

    let internal = internal_name(&fields.stream_name).to_owned();

    let event = Event::new(
        Source::Webhook,
        EventPayload::StreamLifecycle {
            state: LifecycleState::Ended,
            has_issues: false,
            health_score: 0,
            quality_tier: None,
            tracks: Vec::new(),
        },
    )
    .with_internal_name(internal.clone());
    state.events.enqueue(event);

    if let Some(node) = state.node.get() {
        if let Err(error) = state.foghorn.send_dvr_stream_end(&internal, &node.node_id).await {
            tracing::warn!(error = format!("{error:#}"), internal_name = internal, "DVR stream-end notification failed");
        }
    }

    "OK".to_owned()
}

pub async fn live_track_list(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = LiveTrackListFields::parse(&body) else {
        // Short payload: ack, drop event (spec §4.1 decision table).
        return "OK".to_owned();
    };

    let Some(details) = StreamDetails::parse(&fields.tracks_json) else {
        return "OK".to_owned();
    };

    let tracks = details
        .track_details()
        .into_iter()
        .map(|(name, detail)| build_track_summary(name, detail))
        .collect();

    let event = Event::new(Source::Webhook, EventPayload::TrackList { tracks })
        .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "OK".to_owned()
}

pub async fn live_bandwidth(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = LiveBandwidthFields::parse(&body) else {
        // Short payload: ack, drop event (spec §4.1 decision table).
        return "OK".to_owned();
    };

    let Ok(bandwidth_bps) = fields.bandwidth_bps.parse() else {
        return "OK".to_owned();
    };

    let event = Event::new(Source::Webhook, EventPayload::BandwidthThreshold { bandwidth_bps })
        .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "OK".to_owned()
}

pub async fn recording_end(State(state): State<AppState>, body: String) -> String {
    let Some(fields) = RecordingEndFields::parse(&body) else {
        return "OK".to_owned();
    };

    let bytes = fields.bytes.parse().unwrap_or(0);
    let duration_secs = fields.duration_secs.parse().unwrap_or(0.0);

    let event = Event::new(
        Source::Webhook,
        EventPayload::RecordingLifecycle {
            file_path: fields.file_path.clone(),
            bytes,
            duration_secs,
        },
    )
    .with_internal_name(internal_name(&fields.stream_name).to_owned());
    state.events.enqueue(event);

    "OK".to_owned()
}
