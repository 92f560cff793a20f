//! The event envelope (spec §3) and the closed set of event types (spec §4.4).

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Webhook,
    Api,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Webhook => "webhook",
            Source::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    StreamIngest,
    StreamView,
    StreamLifecycle,
    UserConnection,
    ClientLifecycle,
    PushLifecycle,
    RecordingLifecycle,
    NodeLifecycle,
    TrackList,
    BandwidthThreshold,
    LoadBalancing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unspecified,
    Live,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackKind {
    Video,
    Audio,
    Meta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub name: String,
    pub kind: TrackKind,
    pub codec: String,
    pub bitrate_kbps: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
    pub buffer_ms: Option<f64>,
    pub jitter_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    Connect,
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStage {
    Start,
    End,
}

/// Exactly one variant is populated per `Event`, and it is always legal for
/// the `Event`'s declared `EventType` (spec §3 invariant); this is enforced
/// structurally since `EventType` is derived from the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    StreamIngest {
        protocol: String,
    },
    StreamView {
        output_type: String,
        geo: Option<GeoInfo>,
    },
    StreamLifecycle {
        state: LifecycleState,
        has_issues: bool,
        health_score: u8,
        quality_tier: Option<String>,
        tracks: Vec<TrackSummary>,
    },
    UserConnection {
        action: ConnectAction,
        session_id: String,
        geo: Option<GeoInfo>,
        bytes_up: Option<u64>,
        bytes_down: Option<u64>,
        duration_secs: Option<u64>,
    },
    ClientLifecycle {
        stream_name: String,
        protocol: String,
        host: String,
        session_id: String,
        connection_time: DateTime<Utc>,
        position_secs: f64,
        bandwidth_up: f64,
        bandwidth_down: f64,
        bytes_up: u64,
        bytes_down: u64,
        packets_sent: u64,
        packets_lost: u64,
        packets_retransmitted: u64,
    },
    PushLifecycle {
        stage: PushStage,
        target: String,
        reason: Option<String>,
    },
    RecordingLifecycle {
        file_path: String,
        bytes: u64,
        duration_secs: f64,
    },
    NodeLifecycle {
        node_id: String,
        healthy: bool,
        health_score: u8,
    },
    TrackList {
        tracks: Vec<TrackSummary>,
    },
    BandwidthThreshold {
        bandwidth_bps: u64,
    },
    LoadBalancing {
        node_id: String,
        load_score: u8,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::StreamIngest { .. } => EventType::StreamIngest,
            EventPayload::StreamView { .. } => EventType::StreamView,
            EventPayload::StreamLifecycle { .. } => EventType::StreamLifecycle,
            EventPayload::UserConnection { .. } => EventType::UserConnection,
            EventPayload::ClientLifecycle { .. } => EventType::ClientLifecycle,
            EventPayload::PushLifecycle { .. } => EventType::PushLifecycle,
            EventPayload::RecordingLifecycle { .. } => EventType::RecordingLifecycle,
            EventPayload::NodeLifecycle { .. } => EventType::NodeLifecycle,
            EventPayload::TrackList { .. } => EventType::TrackList,
            EventPayload::BandwidthThreshold { .. } => EventType::BandwidthThreshold,
            EventPayload::LoadBalancing { .. } => EventType::LoadBalancing,
        }
    }
}

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: Source,
    pub schema_version: u32,
    pub internal_name: Option<String>,
    pub playback_id: Option<String>,
    pub user_id: Option<String>,
    /// Not part of the public §3 attribute list, but required by §4.6's
    /// "the batcher performs tenant resolution on the first such envelope"
    /// rule: tenant attribution travels with the event until batch assembly
    /// promotes the first non-empty one to the batch level.
    pub tenant_id: Option<String>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(source: Source, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source,
            schema_version: SCHEMA_VERSION,
            internal_name: None,
            playback_id: None,
            user_id: None,
            tenant_id: None,
            payload,
        }
    }

    pub fn with_internal_name(mut self, name: impl Into<String>) -> Self {
        self.internal_name = Some(name.into());
        self
    }

    pub fn with_playback_id(mut self, id: impl Into<String>) -> Self {
        self.playback_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn with_tenant_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.is_empty() {
            self.tenant_id = Some(id);
        }
        self
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}
