//! Newline-delimited trigger/webhook body parsing (spec §4.1).
//!
//! The body carries no JSON envelope; it is trimmed of trailing
//! newline/whitespace and split on line feed into an ordered sequence of
//! fields. Individual trigger parsers apply their own field-count minimum
//! and, where the schema demands it, parse an embedded JSON field.

use serde::Deserialize;

/// Trims trailing newline/whitespace and splits the body on `\n`.
/// `CR` is stripped from each line's tail so `\r\n`-terminated bodies parse
/// the same as `\n`-terminated ones.
pub fn split_fields(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(|line| line.trim_end_matches('\r')).collect()
}

macro_rules! trigger_record {
    ($name:ident, min = $min:expr, { $($field:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: String),+
        }

        impl $name {
            pub const MIN_FIELDS: usize = $min;

            pub fn parse(body: &str) -> Option<Self> {
                let fields = split_fields(body);
                if fields.len() < Self::MIN_FIELDS {
                    return None;
                }
                let mut iter = fields.into_iter();
                Some(Self {
                    $($field: iter.next()?.to_owned()),+
                })
            }
        }
    };
}

trigger_record!(PushRewriteFields, min = 3, { push_url, host, stream_name });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultStreamFields {
    pub playback_id: String,
    pub viewer_host: String,
    pub output_type: Option<String>,
    pub request_url: Option<String>,
}

impl DefaultStreamFields {
    pub const MIN_FIELDS: usize = 2;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            playback_id: fields[0].to_owned(),
            viewer_host: fields[1].to_owned(),
            output_type: fields.get(2).map(|s| (*s).to_owned()),
            request_url: fields.get(3).map(|s| (*s).to_owned()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Full,
    Empty,
    Dry,
    Recover,
    Unknown,
}

impl BufferState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "FULL" => BufferState::Full,
            "EMPTY" => BufferState::Empty,
            "DRY" => BufferState::Dry,
            "RECOVER" => BufferState::Recover,
            _ => BufferState::Unknown,
        }
    }

    /// Per spec §4.3.4: FULL or RECOVER is healthy, everything else is not.
    pub fn is_healthy(self) -> bool {
        matches!(self, BufferState::Full | BufferState::Recover)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackKeyframeTiming {
    #[serde(default, rename = "frame_ms_max")]
    pub frame_ms_max: Option<f64>,
    #[serde(default, rename = "frame_ms_min")]
    pub frame_ms_min: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackDetail {
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub bps: Option<f64>,
    #[serde(default)]
    pub buffer: Option<f64>,
    #[serde(default)]
    pub jitter: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fpks: Option<f64>,
    #[serde(default)]
    pub channels: Option<u32>,
    #[serde(default)]
    pub rate: Option<u32>,
    #[serde(default)]
    pub keys: Option<TrackKeyframeTiming>,
}

/// The embedded "stream details" JSON object (spec §4.3.5): a top-level
/// optional `issues` string plus an open-ended set of per-track records
/// keyed by track name.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamDetails {
    #[serde(default)]
    pub issues: Option<String>,
    #[serde(flatten)]
    pub tracks: std::collections::BTreeMap<String, serde_json::Value>,
}

impl StreamDetails {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Track entries, filtered to the ones that look like per-track health
    /// records (presence of a `codec` field distinguishes them from sibling
    /// keys like `buffer`/`jitter`/`maxkeepaway` per spec §4.5).
    pub fn track_details(&self) -> Vec<(&str, TrackDetail)> {
        self.tracks
            .iter()
            .filter_map(|(name, value)| {
                if value.get("codec").is_none() {
                    return None;
                }
                serde_json::from_value::<TrackDetail>(value.clone())
                    .ok()
                    .map(|detail| (name.as_str(), detail))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBufferFields {
    pub stream_name: String,
    pub state: String,
    pub details: Option<String>,
}

impl StreamBufferFields {
    pub const MIN_FIELDS: usize = 2;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            stream_name: fields[0].to_owned(),
            state: fields[1].to_owned(),
            details: fields.get(2).map(|s| (*s).to_owned()),
        })
    }
}

trigger_record!(PushEndFields, min = 6, {
    stream_name, target, bytes_sent, duration_secs, exit_code, reason
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutStartFields {
    pub stream_name: String,
    pub target: String,
}

impl PushOutStartFields {
    pub const MIN_FIELDS: usize = 2;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            stream_name: fields[0].to_owned(),
            target: fields[1].to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndFields {
    pub stream_name: String,
}

impl StreamEndFields {
    pub const MIN_FIELDS: usize = 1;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            stream_name: fields[0].to_owned(),
        })
    }
}

trigger_record!(UserNewFields, min = 6, {
    host, stream_name, connector, request_url, session_id, user_agent
});

trigger_record!(UserEndFields, min = 8, {
    host, stream_name, connector, request_url, session_id, bytes_up, bytes_down, duration_secs
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTrackListFields {
    pub stream_name: String,
    pub tracks_json: String,
}

impl LiveTrackListFields {
    pub const MIN_FIELDS: usize = 2;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            stream_name: fields[0].to_owned(),
            tracks_json: fields[1].to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveBandwidthFields {
    pub stream_name: String,
    pub bandwidth_bps: String,
}

impl LiveBandwidthFields {
    pub const MIN_FIELDS: usize = 2;

    pub fn parse(body: &str) -> Option<Self> {
        let fields = split_fields(body);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            stream_name: fields[0].to_owned(),
            bandwidth_bps: fields[1].to_owned(),
        })
    }
}

trigger_record!(RecordingEndFields, min = 8, {
    stream_name, file_path, start_unix, stop_unix, bytes, duration_secs, first_ms, last_ms
});

/// Splits the wildcard stream name (`PREFIX + "+" + INTERNAL`) into its
/// internal name. Names without `+` are returned unchanged (spec §3, §8).
pub fn internal_name(wildcard_or_plain: &str) -> &str {
    match wildcard_or_plain.split_once('+') {
        Some((_, internal)) => internal,
        None => wildcard_or_plain,
    }
}

/// Builds the on-wire wildcard name for a newly admitted stream.
pub fn wildcard_name(internal: &str) -> String {
    format!("live+{internal}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_fields_trims_trailing_newline() {
        assert_eq!(split_fields("a\nb\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(split_fields("a\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_fields(""), Vec::<&str>::new());
    }

    #[test]
    fn internal_name_strips_prefix() {
        assert_eq!(internal_name("live+S1"), "S1");
        assert_eq!(internal_name("S1"), "S1");
        assert_eq!(internal_name("a+b+c"), "b+c");
    }

    #[test]
    fn wildcard_name_formats_prefix() {
        assert_eq!(wildcard_name("S1"), "live+S1");
    }

    #[test]
    fn push_rewrite_requires_three_fields() {
        assert!(PushRewriteFields::parse("a\nb").is_none());
        let parsed = PushRewriteFields::parse("rtmp://ingest/app\nexample.com\nstream-key-abc").unwrap();
        assert_eq!(parsed.stream_name, "stream-key-abc");
    }

    #[test]
    fn buffer_state_healthy_set() {
        assert!(BufferState::Full.is_healthy());
        assert!(BufferState::Recover.is_healthy());
        assert!(!BufferState::Empty.is_healthy());
        assert!(!BufferState::Dry.is_healthy());
    }

    #[test]
    fn stream_details_parses_issues_and_tracks() {
        let raw = r#"{"issues":"VeryLowBuffer","video_1":{"codec":"H264","width":1920,"height":1080,"fpks":30000,"keys":{"frame_ms_max":250,"frame_ms_min":30}}}"#;
        let details = StreamDetails::parse(raw).unwrap();
        assert_eq!(details.issues.as_deref(), Some("VeryLowBuffer"));
        let tracks = details.track_details();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].0, "video_1");
        assert_eq!(tracks[0].1.height, Some(1080));
    }
}
