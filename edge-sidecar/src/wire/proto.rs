//! Bridges the internal `Event`/`Batch` types to the generated protobuf
//! wire types (`proto/analytics.proto`), compiled by `build.rs`.

pub mod analytics {
    tonic::include_proto!("analytics");
}

use super::event::{
    ConnectAction, Event, EventPayload, EventType, GeoInfo, LifecycleState, PushStage, Source, TrackKind,
    TrackSummary,
};
use crate::pipeline::batch::Batch;

impl From<EventType> for analytics::EventType {
    fn from(value: EventType) -> Self {
        match value {
            EventType::StreamIngest => analytics::EventType::StreamIngest,
            EventType::StreamView => analytics::EventType::StreamView,
            EventType::StreamLifecycle => analytics::EventType::StreamLifecycle,
            EventType::UserConnection => analytics::EventType::UserConnection,
            EventType::ClientLifecycle => analytics::EventType::ClientLifecycle,
            EventType::PushLifecycle => analytics::EventType::PushLifecycle,
            EventType::RecordingLifecycle => analytics::EventType::RecordingLifecycle,
            EventType::NodeLifecycle => analytics::EventType::NodeLifecycle,
            EventType::TrackList => analytics::EventType::TrackList,
            EventType::BandwidthThreshold => analytics::EventType::BandwidthThreshold,
            EventType::LoadBalancing => analytics::EventType::LoadBalancing,
        }
    }
}

impl From<LifecycleState> for analytics::LifecycleState {
    fn from(value: LifecycleState) -> Self {
        match value {
            LifecycleState::Unspecified => analytics::LifecycleState::Unspecified,
            LifecycleState::Live => analytics::LifecycleState::Live,
            LifecycleState::Ended => analytics::LifecycleState::Ended,
        }
    }
}

impl From<&GeoInfo> for analytics::GeoInfo {
    fn from(geo: &GeoInfo) -> Self {
        analytics::GeoInfo {
            country: geo.country.clone().unwrap_or_default(),
            city: geo.city.clone().unwrap_or_default(),
            latitude: geo.latitude.unwrap_or_default(),
            longitude: geo.longitude.unwrap_or_default(),
        }
    }
}

impl From<&TrackSummary> for analytics::TrackSummary {
    fn from(track: &TrackSummary) -> Self {
        analytics::TrackSummary {
            name: track.name.clone(),
            kind: match track.kind {
                TrackKind::Video => "video",
                TrackKind::Audio => "audio",
                TrackKind::Meta => "meta",
            }
            .to_owned(),
            codec: track.codec.clone(),
            bitrate_kbps: track.bitrate_kbps,
            width: track.width,
            height: track.height,
            fps: track.fps,
            channels: track.channels,
            sample_rate: track.sample_rate,
            buffer_ms: track.buffer_ms,
            jitter_ms: track.jitter_ms,
        }
    }
}

fn connect_action_str(action: ConnectAction) -> &'static str {
    match action {
        ConnectAction::Connect => "connect",
        ConnectAction::Disconnect => "disconnect",
    }
}

fn push_stage_str(stage: PushStage) -> &'static str {
    match stage {
        PushStage::Start => "start",
        PushStage::End => "end",
    }
}

fn source_str(source: Source) -> &'static str {
    source.as_str()
}

impl From<EventPayload> for analytics::event_data::Payload {
    fn from(payload: EventPayload) -> Self {
        use analytics::event_data::Payload;

        match payload {
            EventPayload::StreamIngest { protocol } => {
                Payload::StreamIngest(analytics::StreamIngestPayload { protocol })
            }
            EventPayload::StreamView { output_type, geo } => Payload::StreamView(analytics::StreamViewPayload {
                output_type,
                geo: geo.as_ref().map(Into::into),
            }),
            EventPayload::StreamLifecycle {
                state,
                has_issues,
                health_score,
                quality_tier,
                tracks,
            } => Payload::StreamLifecycle(analytics::StreamLifecyclePayload {
                state: analytics::LifecycleState::from(state) as i32,
                has_issues,
                health_score: health_score.into(),
                quality_tier: quality_tier.unwrap_or_default(),
                tracks: tracks.iter().map(Into::into).collect(),
            }),
            EventPayload::UserConnection {
                action,
                session_id,
                geo,
                bytes_up,
                bytes_down,
                duration_secs,
            } => Payload::UserConnection(analytics::UserConnectionPayload {
                action: connect_action_str(action).to_owned(),
                session_id,
                geo: geo.as_ref().map(Into::into),
                bytes_up,
                bytes_down,
                duration_secs,
            }),
            EventPayload::ClientLifecycle {
                stream_name,
                protocol,
                host,
                session_id,
                connection_time,
                position_secs,
                bandwidth_up,
                bandwidth_down,
                bytes_up,
                bytes_down,
                packets_sent,
                packets_lost,
                packets_retransmitted,
            } => Payload::ClientLifecycle(analytics::ClientLifecyclePayload {
                stream_name,
                protocol,
                host,
                session_id,
                connection_time_unix: connection_time.timestamp(),
                position_secs,
                bandwidth_up,
                bandwidth_down,
                bytes_up,
                bytes_down,
                packets_sent,
                packets_lost,
                packets_retransmitted,
            }),
            EventPayload::PushLifecycle { stage, target, reason } => {
                Payload::PushLifecycle(analytics::PushLifecyclePayload {
                    stage: push_stage_str(stage).to_owned(),
                    target,
                    reason,
                })
            }
            EventPayload::RecordingLifecycle {
                file_path,
                bytes,
                duration_secs,
            } => Payload::RecordingLifecycle(analytics::RecordingLifecyclePayload {
                file_path,
                bytes,
                duration_secs,
            }),
            EventPayload::NodeLifecycle {
                node_id,
                healthy,
                health_score,
            } => Payload::NodeLifecycle(analytics::NodeLifecyclePayload {
                node_id,
                healthy,
                health_score: health_score.into(),
            }),
            EventPayload::TrackList { tracks } => Payload::TrackList(analytics::TrackListPayload {
                tracks: tracks.iter().map(Into::into).collect(),
            }),
            EventPayload::BandwidthThreshold { bandwidth_bps } => {
                Payload::BandwidthThreshold(analytics::BandwidthThresholdPayload { bandwidth_bps })
            }
            EventPayload::LoadBalancing { node_id, load_score } => {
                Payload::LoadBalancing(analytics::LoadBalancingPayload {
                    node_id,
                    load_score: load_score.into(),
                })
            }
        }
    }
}

impl From<Event> for analytics::EventData {
    fn from(event: Event) -> Self {
        let event_type = analytics::EventType::from(event.event_type()) as i32;

        analytics::EventData {
            event_id: event.id.to_string(),
            event_type,
            timestamp_unix_ms: event.timestamp.timestamp_millis(),
            source: source_str(event.source).to_owned(),
            schema_version: event.schema_version,
            stream_name: event.internal_name,
            playback_id: event.playback_id,
            user_id: event.user_id,
            payload: Some(event.payload.into()),
        }
    }
}

impl From<Batch> for analytics::Batch {
    fn from(batch: Batch) -> Self {
        analytics::Batch {
            batch_id: batch.batch_id.to_string(),
            source: source_str(batch.source).to_owned(),
            tenant_id: batch.tenant_id.unwrap_or_default(),
            events: batch.events.into_iter().map(Into::into).collect(),
            metadata: batch.metadata,
            timestamp_unix_ms: batch.timestamp.timestamp_millis(),
        }
    }
}
