//! The local Prometheus scrape surface (spec §1: "the local process's
//! Prometheus scrape endpoint" is an ambient concern carried regardless of
//! the core's non-goals; spec §4.5: "a parallel in-process Prometheus gauge
//! surface is updated" per client row).

use prometheus::{GaugeVec, Opts, Registry};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub node_health_score: GaugeVec,
    pub client_bandwidth_up_bps: GaugeVec,
    pub client_bandwidth_down_bps: GaugeVec,
    pub stream_viewer_count: GaugeVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let node_health_score = GaugeVec::new(
            Opts::new("edge_sidecar_node_health_score", "Current node health score (0-100)"),
            &["node_id"],
        )?;
        let client_bandwidth_up_bps = GaugeVec::new(
            Opts::new("edge_sidecar_client_bandwidth_up_bps", "Per-session upstream bandwidth"),
            &["stream", "session_id"],
        )?;
        let client_bandwidth_down_bps = GaugeVec::new(
            Opts::new(
                "edge_sidecar_client_bandwidth_down_bps",
                "Per-session downstream bandwidth",
            ),
            &["stream", "session_id"],
        )?;
        let stream_viewer_count = GaugeVec::new(
            Opts::new("edge_sidecar_stream_viewer_count", "Viewer count per active stream"),
            &["stream"],
        )?;

        registry.register(Box::new(node_health_score.clone()))?;
        registry.register(Box::new(client_bandwidth_up_bps.clone()))?;
        registry.register(Box::new(client_bandwidth_down_bps.clone()))?;
        registry.register(Box::new(stream_viewer_count.clone()))?;

        Ok(Self {
            registry,
            node_health_score,
            client_bandwidth_up_bps,
            client_bandwidth_down_bps,
            stream_viewer_count,
        })
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        use prometheus::Encoder as _;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
