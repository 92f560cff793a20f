//! Table-driven field-count contract tests for spec §4.1: each trigger's
//! minimum field count, verified against both a short payload (rejected)
//! and one with exactly the minimum and one more than the minimum fields.

use edge_sidecar::wire::codec::{
    DefaultStreamFields, LiveBandwidthFields, LiveTrackListFields, PushEndFields, PushOutStartFields,
    PushRewriteFields, RecordingEndFields, StreamBufferFields, StreamEndFields, UserEndFields, UserNewFields,
};
use rstest::rstest;

fn body_with_fields(count: usize) -> String {
    (0..count).map(|i| format!("field{i}")).collect::<Vec<_>>().join("\n")
}

#[rstest]
#[case::push_rewrite(PushRewriteFields::MIN_FIELDS, (|b| PushRewriteFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::default_stream(DefaultStreamFields::MIN_FIELDS, (|b| DefaultStreamFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::stream_buffer(StreamBufferFields::MIN_FIELDS, (|b| StreamBufferFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::push_end(PushEndFields::MIN_FIELDS, (|b| PushEndFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::push_out_start(PushOutStartFields::MIN_FIELDS, (|b| PushOutStartFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::stream_end(StreamEndFields::MIN_FIELDS, (|b| StreamEndFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::user_new(UserNewFields::MIN_FIELDS, (|b| UserNewFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::user_end(UserEndFields::MIN_FIELDS, (|b| UserEndFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::live_track_list(LiveTrackListFields::MIN_FIELDS, (|b| LiveTrackListFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::live_bandwidth(LiveBandwidthFields::MIN_FIELDS, (|b| LiveBandwidthFields::parse(b).is_some()) as fn(&str) -> bool)]
#[case::recording_end(RecordingEndFields::MIN_FIELDS, (|b| RecordingEndFields::parse(b).is_some()) as fn(&str) -> bool)]
fn rejects_below_min_and_accepts_at_min(#[case] min_fields: usize, #[case] parses: fn(&str) -> bool) {
    assert!(!parses(&body_with_fields(min_fields - 1)), "below MIN_FIELDS must be rejected");
    assert!(parses(&body_with_fields(min_fields)), "exactly MIN_FIELDS must be accepted");
    assert!(parses(&body_with_fields(min_fields + 3)), "extra trailing fields must still be accepted");
}
