/// Protocol tag inferred from a push URL's scheme (spec §4.3.1).
pub fn protocol_from_scheme(push_url: &str) -> String {
    let scheme = push_url.split("://").next().unwrap_or_default();
    match scheme {
        "rtmp" => "rtmp",
        "srt" => "srt",
        "whip" => "whip",
        "http" | "https" => "http",
        _ => "unknown",
    }
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_schemes() {
        assert_eq!(protocol_from_scheme("rtmp://ingest/app"), "rtmp");
        assert_eq!(protocol_from_scheme("srt://ingest"), "srt");
        assert_eq!(protocol_from_scheme("whip://ingest"), "whip");
        assert_eq!(protocol_from_scheme("https://ingest"), "http");
        assert_eq!(protocol_from_scheme("ftp://ingest"), "unknown");
    }
}
