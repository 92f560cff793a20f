//! The legacy map-shaped producer path (spec §4.6, §9 "Untyped maps on the
//! producer side"). No handler in this crate actually enqueues through it —
//! every handler in `triggers/` and `poller/` uses the typed `Event` path —
//! but the queue, the per-event-type dispatch table, and the batcher's
//! merge-by-id rule (`legacy_event_id`/`merge_legacy_into_event`, applied in
//! `pipeline::batch`) are kept so the wire format and field-name contracts
//! documented in spec.md stay faithful even if a future producer needs the
//! untyped shape for compatibility. Spec §9: "When both paths coexist for
//! compatibility, the batcher must merge by event id and prefer typed
//! fields" — a legacy entry whose `event_id` matches an already-pending
//! typed `Event` is merged into it rather than becoming a second event, and
//! only fills fields the typed event left unset.

use std::collections::HashMap;

use serde_json::Value;

use crate::wire::event::{ConnectAction, Event, EventPayload, LifecycleState, Source};

#[derive(Debug, Clone)]
pub struct LegacyEvent {
    pub event_type: String,
    pub fields: HashMap<String, Value>,
}

fn field_str(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn field_u64(fields: &HashMap<String, Value>, key: &str) -> Option<u64> {
    fields.get(key).and_then(Value::as_u64)
}

/// Maps a legacy untyped entry to the typed envelope it would have produced
/// had the handler used the structured path. Unrecognized event types (or
/// entries missing required fields) are logged and dropped by the caller
/// (spec §7 error kind (d)).
pub fn legacy_to_event(legacy: &LegacyEvent) -> Option<Event> {
    let fields = &legacy.fields;

    let payload = match legacy.event_type.as_str() {
        "stream-ingest" => EventPayload::StreamIngest {
            protocol: field_str(fields, "protocol").unwrap_or_else(|| "unknown".to_owned()),
        },
        "stream-view" => EventPayload::StreamView {
            output_type: field_str(fields, "output_type").unwrap_or_default(),
            geo: None,
        },
        "stream-lifecycle" => EventPayload::StreamLifecycle {
            state: match field_str(fields, "state").as_deref() {
                Some("STATE_LIVE") => LifecycleState::Live,
                Some("STATE_ENDED") => LifecycleState::Ended,
                _ => LifecycleState::Unspecified,
            },
            has_issues: fields.get("has_issues").and_then(Value::as_bool).unwrap_or(false),
            health_score: fields.get("health_score").and_then(Value::as_u64).unwrap_or(0) as u8,
            quality_tier: field_str(fields, "quality_tier"),
            tracks: Vec::new(),
        },
        "user-connection" => EventPayload::UserConnection {
            action: match field_str(fields, "action").as_deref() {
                Some("disconnect") => ConnectAction::Disconnect,
                _ => ConnectAction::Connect,
            },
            session_id: field_str(fields, "session_id")?,
            geo: None,
            bytes_up: field_u64(fields, "bytes_up"),
            bytes_down: field_u64(fields, "bytes_down"),
            duration_secs: field_u64(fields, "duration_secs"),
        },
        "bandwidth-threshold" => EventPayload::BandwidthThreshold {
            bandwidth_bps: field_u64(fields, "bandwidth_bps")?,
        },
        "load-balancing" => EventPayload::LoadBalancing {
            node_id: field_str(fields, "node_id")?,
            load_score: fields.get("load_score").and_then(Value::as_u64).unwrap_or(0) as u8,
        },
        _ => return None,
    };

    let source = match field_str(fields, "source").as_deref() {
        Some("api") => Source::Api,
        _ => Source::Webhook,
    };

    let mut event = Event::new(source, payload);
    if let Some(internal_name) = field_str(fields, "internal_name") {
        event = event.with_internal_name(internal_name);
    }
    if let Some(tenant_id) = field_str(fields, "tenant_id") {
        event = event.with_tenant_id(tenant_id);
    }
    Some(event)
}

/// The identifier a legacy entry uses to correlate with an already-pending
/// typed `Event` (spec §9's merge-by-id rule). Absent on entries that have
/// no typed counterpart to merge into.
pub fn legacy_event_id(legacy: &LegacyEvent) -> Option<String> {
    field_str(&legacy.fields, "event_id")
}

/// Merges a legacy entry into an already-pending typed `Event` sharing its
/// event id. Typed fields win: a legacy value only fills a field the typed
/// event left unset.
pub fn merge_legacy_into_event(event: &mut Event, legacy: &LegacyEvent) {
    let fields = &legacy.fields;

    if event.internal_name.is_none() {
        event.internal_name = field_str(fields, "internal_name");
    }
    if event.playback_id.is_none() {
        event.playback_id = field_str(fields, "playback_id");
    }
    if event.user_id.is_none() {
        event.user_id = field_str(fields, "user_id");
    }
    if event.tenant_id.is_none() {
        if let Some(tenant_id) = field_str(fields, "tenant_id").filter(|id| !id.is_empty()) {
            event.tenant_id = Some(tenant_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(event_type: &str, fields: &[(&str, &str)]) -> LegacyEvent {
        LegacyEvent {
            event_type: event_type.to_owned(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), Value::String((*v).to_owned())))
                .collect(),
        }
    }

    #[test]
    fn legacy_event_id_reads_the_event_id_field() {
        let entry = legacy("stream-ingest", &[("event_id", "abc-123")]);
        assert_eq!(legacy_event_id(&entry).as_deref(), Some("abc-123"));

        let without_id = legacy("stream-ingest", &[]);
        assert_eq!(legacy_event_id(&without_id), None);
    }

    #[test]
    fn merge_prefers_already_set_typed_fields() {
        let mut event = Event::new(Source::Webhook, EventPayload::StreamIngest { protocol: "rtmp".to_owned() })
            .with_internal_name("typed-name");
        let entry = legacy(
            "stream-ingest",
            &[("internal_name", "legacy-name"), ("tenant_id", "T1")],
        );

        merge_legacy_into_event(&mut event, &entry);

        // Typed field was already set, so the legacy value is ignored.
        assert_eq!(event.internal_name.as_deref(), Some("typed-name"));
        // Tenant id was unset on the typed event, so the legacy value fills it.
        assert_eq!(event.tenant_id.as_deref(), Some("T1"));
    }

    #[test]
    fn merge_fills_unset_fields_only() {
        let mut event = Event::new(Source::Webhook, EventPayload::StreamIngest { protocol: "rtmp".to_owned() });
        let entry = legacy("stream-ingest", &[("internal_name", "legacy-name")]);

        merge_legacy_into_event(&mut event, &entry);

        assert_eq!(event.internal_name.as_deref(), Some("legacy-name"));
    }
}
