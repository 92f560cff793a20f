//! Integration tests for the event queue and batch-assembly invariants
//! (spec §4.6, §8). Exercises only the pure/public surface — no outbound
//! network calls (`DecklogClient`/`TenantResolver` are not constructed here).

use std::collections::HashMap;

use edge_sidecar::pipeline::{channel, Batch};
use edge_sidecar::wire::{Event, EventPayload, Source};

fn sample_event(tenant_id: Option<&str>) -> Event {
    let mut event = Event::new(
        Source::Webhook,
        EventPayload::StreamIngest {
            protocol: "rtmp".to_owned(),
        },
    )
    .with_internal_name("S1");

    if let Some(tenant_id) = tenant_id {
        event = event.with_tenant_id(tenant_id);
    }

    event
}

#[test]
fn batch_from_events_rejects_empty() {
    assert!(Batch::from_events(Vec::new(), HashMap::new()).is_none());
}

#[test]
fn batch_adopts_first_non_empty_tenant_id() {
    let events = vec![sample_event(None), sample_event(Some("tenant-a")), sample_event(Some("tenant-b"))];
    let batch = Batch::from_events(events, HashMap::new()).expect("non-empty events produce a batch");
    assert_eq!(batch.tenant_id.as_deref(), Some("tenant-a"));
    assert_eq!(batch.events.len(), 3);
}

#[test]
fn batch_tenant_id_is_none_when_no_event_carries_one() {
    let events = vec![sample_event(None), sample_event(None)];
    let batch = Batch::from_events(events, HashMap::new()).unwrap();
    assert_eq!(batch.tenant_id, None);
}

#[tokio::test]
async fn producer_delivers_events_in_order_to_a_non_full_queue() {
    let (producer, mut consumer) = channel(10);

    for i in 0..5 {
        producer.enqueue(sample_event(Some(&format!("tenant-{i}"))));
    }

    for i in 0..5 {
        let event = consumer.typed_rx.recv().await.expect("event delivered");
        assert_eq!(event.tenant_id.as_deref(), Some(format!("tenant-{i}").as_str()));
    }
}

#[tokio::test]
async fn producer_drops_events_past_capacity_without_blocking() {
    // capacity = batch_size * 2
    let (producer, mut consumer) = channel(2);

    // Fill the queue (capacity 4) then push one more; enqueue must not block
    // the caller (spec §4.6) even though the channel is full.
    for _ in 0..5 {
        producer.enqueue(sample_event(None));
    }

    let mut received = 0;
    while consumer.typed_rx.try_recv().is_ok() {
        received += 1;
    }

    assert_eq!(received, 4, "only the channel's bounded capacity is retained");
}
