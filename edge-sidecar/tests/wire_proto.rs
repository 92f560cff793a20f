//! `Event`/`Batch` -> protobuf conversion (spec §3, §4.4).

use std::collections::HashMap;

use edge_sidecar::pipeline::Batch;
use edge_sidecar::wire::event::{ConnectAction, GeoInfo};
use edge_sidecar::wire::proto::analytics;
use edge_sidecar::wire::{Event, EventPayload, Source};

#[test]
fn event_conversion_preserves_identity_and_payload_fields() {
    let event = Event::new(
        Source::Webhook,
        EventPayload::UserConnection {
            action: ConnectAction::Connect,
            session_id: "sess-1".to_owned(),
            geo: Some(GeoInfo {
                country: Some("US".to_owned()),
                city: None,
                latitude: Some(37.0),
                longitude: Some(-122.0),
            }),
            bytes_up: None,
            bytes_down: None,
            duration_secs: None,
        },
    )
    .with_internal_name("S1");

    let expected_id = event.id.to_string();
    let data = analytics::EventData::from(event);

    assert_eq!(data.event_id, expected_id);
    assert_eq!(data.stream_name.as_deref(), Some("S1"));
    assert_eq!(data.event_type, analytics::EventType::UserConnection as i32);

    match data.payload.unwrap() {
        analytics::event_data::Payload::UserConnection(payload) => {
            assert_eq!(payload.action, "connect");
            assert_eq!(payload.session_id, "sess-1");
            let geo = payload.geo.unwrap();
            assert_eq!(geo.country, "US");
        }
        other => panic!("unexpected payload variant: {other:?}"),
    }
}

#[test]
fn batch_conversion_defaults_missing_tenant_to_empty_string() {
    let event = Event::new(
        Source::Api,
        EventPayload::BandwidthThreshold { bandwidth_bps: 5_000_000 },
    );
    let batch = Batch::from_events(vec![event], HashMap::new()).unwrap();

    let wire_batch = analytics::Batch::from(batch);
    assert_eq!(wire_batch.tenant_id, "");
    assert_eq!(wire_batch.events.len(), 1);
}
