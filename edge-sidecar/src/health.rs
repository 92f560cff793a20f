//! Per-track telemetry derivation shared by the stream-buffer trigger and
//! the live-track-list webhook (spec §4.3.5). Node-level health scoring
//! (spec §4.5) lives in `poller::derive` since it aggregates across the
//! whole node rather than a single stream's "details" document.

use crate::wire::codec::{StreamDetails, TrackDetail};
use crate::wire::event::{TrackKind, TrackSummary};

pub struct StreamHealth {
    pub has_issues: bool,
    pub health_score: u8,
    pub quality_tier: Option<String>,
    pub tracks: Vec<TrackSummary>,
}

/// Track type is inferred from a `video_`/`audio_`/`meta_` name prefix, or
/// from codec family when the name gives no hint (spec §4.5).
pub fn track_kind(name: &str, codec: &str) -> TrackKind {
    match name.split('_').next() {
        Some("video") => return TrackKind::Video,
        Some("audio") => return TrackKind::Audio,
        Some("meta") => return TrackKind::Meta,
        _ => {}
    }

    match codec.to_ascii_uppercase().as_str() {
        "H264" | "H265" | "HEVC" | "AV1" | "VP8" | "VP9" => TrackKind::Video,
        "AAC" | "OPUS" | "MP3" | "AC3" => TrackKind::Audio,
        _ => TrackKind::Meta,
    }
}

pub fn build_track_summary(name: &str, detail: TrackDetail) -> TrackSummary {
    let codec = detail.codec.unwrap_or_else(|| "unknown".to_owned());
    let kind = track_kind(name, &codec);

    TrackSummary {
        name: name.to_owned(),
        kind,
        codec,
        bitrate_kbps: detail.bps.map(|bps| (bps / 1000.0) as u32).unwrap_or(0),
        width: detail.width,
        height: detail.height,
        fps: detail.fpks.map(|fpks| fpks / 1000.0),
        channels: detail.channels,
        sample_rate: detail.rate,
        buffer_ms: detail.buffer,
        jitter_ms: detail.jitter,
    }
}

/// The keyframe-timing spread (`frame_ms_max - frame_ms_min`), distinct from
/// the raw `jitter` field: this is what §4.3.5's "max-track frame-jitter"
/// refers to.
fn frame_jitter_ms(detail: &TrackDetail) -> Option<f64> {
    let keys = detail.keys.as_ref()?;
    Some(keys.frame_ms_max? - keys.frame_ms_min?)
}

fn tier_for_height(height: u32) -> String {
    match height {
        h if h >= 1080 => "1080p+",
        h if h >= 720 => "720p",
        h if h >= 480 => "480p",
        _ => "SD",
    }
    .to_owned()
}

/// Derives `has_issues`, `health_score` and `quality_tier` from an embedded
/// "stream details" document (spec §4.3.5).
pub fn derive_stream_health(details: &StreamDetails) -> StreamHealth {
    let has_issues = details.issues.is_some();
    let raw = details.track_details();

    let max_frame_jitter = raw.iter().filter_map(|(_, detail)| frame_jitter_ms(detail)).fold(0.0_f64, f64::max);

    let mut score = 100.0_f64;
    if has_issues {
        score -= 30.0;
    }
    score -= (max_frame_jitter * 0.4).min(40.0);
    let health_score = score.clamp(0.0, 100.0) as u8;

    let tracks: Vec<TrackSummary> = raw.into_iter().map(|(name, detail)| build_track_summary(name, detail)).collect();
    let quality_tier = tracks
        .iter()
        .find(|track| matches!(track.kind, TrackKind::Video))
        .and_then(|track| track.height)
        .map(tier_for_height);

    StreamHealth {
        has_issues,
        health_score,
        quality_tier,
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_stream_buffer_with_issues() {
        let raw = r#"{"issues":"VeryLowBuffer","video_1":{"codec":"H264","width":1920,"height":1080,"fpks":30000,"keys":{"frame_ms_max":250,"frame_ms_min":30}}}"#;
        let details = StreamDetails::parse(raw).unwrap();
        let health = derive_stream_health(&details);
        assert!(health.has_issues);
        assert_eq!(health.health_score, 30);
        assert_eq!(health.quality_tier.as_deref(), Some("1080p+"));
    }

    #[test]
    fn health_score_never_goes_negative() {
        let raw = r#"{"issues":"x","video_1":{"codec":"H264","keys":{"frame_ms_max":1000,"frame_ms_min":0}}}"#;
        let details = StreamDetails::parse(raw).unwrap();
        let health = derive_stream_health(&details);
        assert_eq!(health.health_score, 0);
    }
}
