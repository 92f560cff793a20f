//! Property tests for spec §8 invariants: the wildcard-name round trip and
//! health-score clamping to [0, 100].

use edge_sidecar::health::derive_stream_health;
use edge_sidecar::wire::codec::{internal_name, wildcard_name, StreamDetails};
use proptest::prelude::*;

proptest! {
    #[test]
    fn wildcard_name_round_trips_for_any_slash_free_internal_name(
        name in "[a-zA-Z0-9_-]{1,64}"
    ) {
        let wrapped = wildcard_name(&name);
        prop_assert_eq!(internal_name(&wrapped), name.as_str());
    }

    #[test]
    fn health_score_stays_within_zero_to_hundred(
        has_issues in any::<bool>(),
        frame_ms_max in -1000.0_f64..10_000.0,
        frame_ms_min in -1000.0_f64..10_000.0,
    ) {
        let issues_field = if has_issues { r#""issues":"VeryLowBuffer","# } else { "" };
        let raw = format!(
            r#"{{{issues_field}"video_1":{{"codec":"H264","keys":{{"frame_ms_max":{frame_ms_max},"frame_ms_min":{frame_ms_min}}}}}}}"#
        );
        let details = StreamDetails::parse(&raw).expect("well-formed JSON");
        let health = derive_stream_health(&details);
        prop_assert!(health.health_score <= 100);
    }
}
