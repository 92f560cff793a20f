//! Pure telemetry-derivation helpers for the metrics poller (spec §4.5).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::health::build_track_summary;
use crate::wire::codec::{internal_name, StreamDetails};
use crate::wire::event::{Event, EventPayload, Source, TrackSummary};

pub struct ClientRow {
    pub stream: String,
    pub protocol: String,
    pub host: String,
    pub session_id: String,
    pub connection_time: DateTime<Utc>,
    pub position_secs: f64,
    pub bandwidth_up: f64,
    pub bandwidth_down: f64,
    pub bytes_up: u64,
    pub bytes_down: u64,
    pub packets_sent: u64,
    pub packets_lost: u64,
    pub packets_retransmitted: u64,
}

fn column_index(fields: &[String], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| fields.iter().position(|f| f == name))
}

fn as_f64(value: &JsonValue) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

fn as_u64(value: &JsonValue) -> u64 {
    value.as_u64().unwrap_or_else(|| as_f64(value) as u64)
}

fn as_str(value: &JsonValue) -> String {
    value.as_str().map(str::to_owned).unwrap_or_default()
}

/// Parses the `clients` RPC's column-oriented table (spec §4.5: a field-name
/// array and one row per connection), accepting both the short and long
/// spellings of the packet-counter columns.
pub fn parse_clients_table(value: &JsonValue) -> Vec<ClientRow> {
    let Some(field_values) = value.get("fields").and_then(JsonValue::as_array) else {
        return Vec::new();
    };
    let fields: Vec<String> = field_values.iter().filter_map(|f| f.as_str().map(str::to_owned)).collect();

    let Some(rows) = value.get("data").and_then(JsonValue::as_array) else {
        return Vec::new();
    };

    let idx_stream = column_index(&fields, &["stream"]);
    let idx_protocol = column_index(&fields, &["protocol"]);
    let idx_host = column_index(&fields, &["host"]);
    let idx_session = column_index(&fields, &["sessid", "session_id"]);
    let idx_conntime = column_index(&fields, &["conntime", "connection_time"]);
    let idx_position = column_index(&fields, &["position"]);
    let idx_down = column_index(&fields, &["down"]);
    let idx_up = column_index(&fields, &["up"]);
    let idx_downbps = column_index(&fields, &["downbps", "bandwidth_down"]);
    let idx_upbps = column_index(&fields, &["upbps", "bandwidth_up"]);
    let idx_pktcount = column_index(&fields, &["pktcount", "packet_count"]);
    let idx_pktlost = column_index(&fields, &["pktlost", "packet_lost"]);
    let idx_pktretransmit = column_index(&fields, &["pktretransmit", "packet_retransmit"]);

    rows.iter()
        .filter_map(JsonValue::as_array)
        .map(|row| {
            let get = |idx: Option<usize>| idx.and_then(|i| row.get(i));
            let conntime_secs = get(idx_conntime).map(as_u64).unwrap_or(0);
            let connection_time = DateTime::from_timestamp(conntime_secs as i64, 0).unwrap_or_else(Utc::now);

            ClientRow {
                stream: get(idx_stream).map(as_str).unwrap_or_default(),
                protocol: get(idx_protocol).map(as_str).unwrap_or_default(),
                host: get(idx_host).map(as_str).unwrap_or_default(),
                session_id: get(idx_session).map(as_str).unwrap_or_default(),
                connection_time,
                position_secs: get(idx_position).map(as_f64).unwrap_or(0.0),
                bandwidth_up: get(idx_upbps).map(as_f64).unwrap_or(0.0),
                bandwidth_down: get(idx_downbps).map(as_f64).unwrap_or(0.0),
                bytes_up: get(idx_up).map(as_u64).unwrap_or(0),
                bytes_down: get(idx_down).map(as_u64).unwrap_or(0),
                packets_sent: get(idx_pktcount).map(as_u64).unwrap_or(0),
                packets_lost: get(idx_pktlost).map(as_u64).unwrap_or(0),
                packets_retransmitted: get(idx_pktretransmit).map(as_u64).unwrap_or(0),
            }
        })
        .collect()
}

pub fn client_row_to_event(row: &ClientRow) -> Event {
    Event::new(
        Source::Api,
        EventPayload::ClientLifecycle {
            stream_name: row.stream.clone(),
            protocol: row.protocol.clone(),
            host: row.host.clone(),
            session_id: row.session_id.clone(),
            connection_time: row.connection_time,
            position_secs: row.position_secs,
            bandwidth_up: row.bandwidth_up,
            bandwidth_down: row.bandwidth_down,
            bytes_up: row.bytes_up,
            bytes_down: row.bytes_down,
            packets_sent: row.packets_sent,
            packets_lost: row.packets_lost,
            packets_retransmitted: row.packets_retransmitted,
        },
    )
    .with_internal_name(internal_name(&row.stream).to_owned())
}

/// Pulls nested per-track health documents out of the `active_streams`
/// response so node-level scoring can inspect jitter/buffer across every
/// stream on the node (spec §4.5).
pub fn extract_health_tracks(active_streams: &JsonValue) -> Vec<TrackSummary> {
    let Some(map) = active_streams.as_object() else {
        return Vec::new();
    };

    map.values()
        .filter_map(|stream| stream.get("health"))
        .filter_map(|health| serde_json::from_value::<StreamDetails>(health.clone()).ok())
        .flat_map(|details| {
            details
                .track_details()
                .into_iter()
                .map(|(name, detail)| build_track_summary(name, detail))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn total_packet_loss_ratio(rows: &[ClientRow]) -> f64 {
    let sent: u64 = rows.iter().map(|row| row.packets_sent).sum();
    let lost: u64 = rows.iter().map(|row| row.packets_lost).sum();
    if sent == 0 {
        0.0
    } else {
        lost as f64 / sent as f64
    }
}

/// spec §4.5 "Node health scoring".
pub fn node_health_score(packet_loss_ratio: f64, tracks: &[TrackSummary]) -> u8 {
    let mut score: i32 = 100;

    if packet_loss_ratio > 0.05 {
        score -= 30;
    } else if packet_loss_ratio > 0.01 {
        score -= 10;
    }

    for track in tracks {
        if track.jitter_ms.is_some_and(|jitter| jitter > 100.0) {
            score -= 20;
        }
        if track.buffer_ms.is_some_and(|buffer| buffer < 50.0) {
            score -= 15;
        }
    }

    score.clamp(0, 100) as u8
}

pub fn viewer_counts(active_streams: &JsonValue) -> HashMap<String, u64> {
    let Some(map) = active_streams.as_object() else {
        return HashMap::new();
    };

    map.iter()
        .filter_map(|(name, record)| record.get("curr").and_then(JsonValue::as_u64).map(|viewers| (name.clone(), viewers)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_health_score_clamps_at_zero() {
        let tracks = vec![
            TrackSummary {
                name: "video_1".into(),
                kind: crate::wire::event::TrackKind::Video,
                codec: "H264".into(),
                bitrate_kbps: 0,
                width: None,
                height: None,
                fps: None,
                channels: None,
                sample_rate: None,
                buffer_ms: Some(10.0),
                jitter_ms: Some(200.0),
            };
            5
        ];
        assert_eq!(node_health_score(0.1, &tracks), 0);
    }

    #[test]
    fn parses_column_oriented_clients_table() {
        let value = serde_json::json!({
            "fields": ["stream", "protocol", "host", "sessid", "conntime", "position", "down", "up", "downbps", "upbps", "pktcount", "pktlost", "pktretransmit"],
            "data": [["live+S1", "hls", "viewer.example", "sess-1", 1_700_000_000, 12.5, 1000, 2000, 500.0, 250.0, 100, 1, 0]],
        });
        let rows = parse_clients_table(&value);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stream, "live+S1");
        assert_eq!(rows[0].packets_lost, 1);
    }
}
