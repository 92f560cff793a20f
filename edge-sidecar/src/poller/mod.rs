//! The metrics poller (spec §4.5): a 10s scheduler driving three parallel
//! fetches against the streaming server's control API, deriving node,
//! stream and client telemetry from the results.

mod derive;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::clients::foghorn::{FoghornClient, NodeMetricsUpdate};
use crate::clients::mist_api::MistApiClient;
use crate::metrics::Metrics;
use crate::node::NodeStore;
use crate::pipeline::EventProducer;
use crate::task::{ShutdownSignal, Task};
use crate::wire::event::{Event, EventPayload, Source};

const TICK_INTERVAL: Duration = Duration::from_secs(10);

pub struct PollerTask {
    pub mist_api: Arc<MistApiClient>,
    pub node: NodeStore,
    pub events: EventProducer,
    pub foghorn: FoghornClient,
    pub metrics: Metrics,
}

#[async_trait]
impl Task for PollerTask {
    type Output = anyhow::Result<()>;

    const NAME: &'static str = "poller";

    async fn run(self, mut shutdown_signal: ShutdownSignal) -> Self::Output {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown_signal.wait() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        Ok(())
    }
}

impl PollerTask {
    #[tracing::instrument(skip(self))]
    async fn tick(&self) {
        // spec §8: with no node configured, no outbound requests are performed.
        let Some(node) = self.node.get() else {
            return;
        };

        let status_fut = {
            let mist_api = Arc::clone(&self.mist_api);
            tokio::spawn(async move { mist_api.fetch_status_json().await })
        };
        let active_streams_fut = {
            let mist_api = Arc::clone(&self.mist_api);
            tokio::spawn(async move { mist_api.active_streams().await })
        };
        let clients_fut = {
            let mist_api = Arc::clone(&self.mist_api);
            tokio::spawn(async move { mist_api.clients().await })
        };

        let (status, active_streams, clients) = tokio::join!(status_fut, active_streams_fut, clients_fut);

        let status = flatten_fetch(status, "status JSON");
        let active_streams = flatten_fetch(active_streams, "active_streams");
        let clients = flatten_fetch(clients, "clients");

        let client_rows = clients.as_ref().map(derive::parse_clients_table).unwrap_or_default();
        for row in &client_rows {
            self.events.enqueue(derive::client_row_to_event(row));
            self.metrics
                .client_bandwidth_up_bps
                .with_label_values(&[&row.stream, &row.session_id])
                .set(row.bandwidth_up);
            self.metrics
                .client_bandwidth_down_bps
                .with_label_values(&[&row.stream, &row.session_id])
                .set(row.bandwidth_down);
        }

        if let Some(active_streams) = &active_streams {
            for (stream, viewers) in derive::viewer_counts(active_streams) {
                self.metrics.stream_viewer_count.with_label_values(&[&stream]).set(viewers as f64);
            }
        }

        let health_tracks = active_streams.as_ref().map(derive::extract_health_tracks).unwrap_or_default();
        let packet_loss_ratio = derive::total_packet_loss_ratio(&client_rows);
        let health_score = derive::node_health_score(packet_loss_ratio, &health_tracks);
        let healthy = health_score >= 50;

        let outputs = status.as_ref().and_then(|value| value.get("outputs")).cloned();
        let (latitude, longitude, location_name) = status
            .as_ref()
            .and_then(|value| value.get("loc"))
            .map(|loc| {
                (
                    loc.get("lat").and_then(serde_json::Value::as_f64),
                    loc.get("lon").and_then(serde_json::Value::as_f64),
                    loc.get("name").and_then(serde_json::Value::as_str).map(str::to_owned),
                )
            })
            .unwrap_or((None, None, None));

        self.node.update(|state| {
            state.last_seen = Some(Utc::now());
            state.healthy = healthy;
            state.health_score = health_score;
            state.latitude = latitude;
            state.longitude = longitude;
            state.location_name = location_name;
            state.last_snapshot = status.clone();
        });

        self.metrics.node_health_score.with_label_values(&[&node.node_id]).set(health_score as f64);

        self.events.enqueue(Event::new(
            Source::Api,
            EventPayload::NodeLifecycle {
                node_id: node.node_id.clone(),
                healthy,
                health_score,
            },
        ));

        let update = NodeMetricsUpdate {
            node_id: &node.node_id,
            base_url: node.base_url.as_str(),
            healthy,
            health_score,
            outputs,
        };
        if let Err(error) = self.foghorn.send_node_metrics(&update).await {
            tracing::warn!(error = format!("{error:#}"), "node metrics update failed");
        }
    }
}

fn flatten_fetch(
    result: Result<anyhow::Result<serde_json::Value>, tokio::task::JoinError>,
    label: &str,
) -> Option<serde_json::Value> {
    match result {
        Ok(Ok(value)) => Some(value),
        Ok(Err(error)) => {
            tracing::warn!(error = format!("{error:#}"), "{label} fetch failed");
            None
        }
        Err(error) => {
            tracing::error!(error = %error, "{label} task panicked");
            None
        }
    }
}
