//! `NodeStore` single-node cache semantics (spec §3, §6) and the Prometheus
//! scrape surface (SPEC_FULL.md §G).

use edge_sidecar::metrics::Metrics;
use edge_sidecar::node::NodeStore;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn node_store_starts_empty_and_round_trips_through_set_get_remove() {
    let store = NodeStore::default();
    assert!(store.get().is_none());

    let node = store.set("node-1".to_owned(), url("http://node-1.internal:8080"));
    assert_eq!(node.node_id, "node-1");
    assert_eq!(node.health_score, 100);

    let fetched = store.get().expect("node was just set");
    assert_eq!(fetched.node_id, "node-1");

    let removed = store.remove().expect("node was set");
    assert_eq!(removed.node_id, "node-1");
    assert!(store.get().is_none());
}

#[test]
fn node_store_update_is_a_no_op_after_removal() {
    let store = NodeStore::default();
    store.set("node-1".to_owned(), url("http://node-1.internal:8080"));
    store.remove();

    // Must not panic even though there is no node left to mutate.
    store.update(|node| node.health_score = 0);
    assert!(store.get().is_none());
}

#[test]
fn node_store_update_mutates_the_current_node_in_place() {
    let store = NodeStore::default();
    store.set("node-1".to_owned(), url("http://node-1.internal:8080"));

    store.update(|node| {
        node.health_score = 42;
        node.healthy = false;
    });

    let node = store.get().unwrap();
    assert_eq!(node.health_score, 42);
    assert!(!node.healthy);
}

#[test]
fn metrics_encode_exposes_the_registered_gauge_families() {
    let metrics = Metrics::new().expect("registry builds");
    metrics
        .node_health_score
        .with_label_values(&["node-1"])
        .set(87.0);
    metrics
        .stream_viewer_count
        .with_label_values(&["S1"])
        .set(12.0);

    let encoded = metrics.encode().expect("text exposition succeeds");
    assert!(encoded.contains("node_health_score"));
    assert!(encoded.contains("stream_viewer_count"));
}
