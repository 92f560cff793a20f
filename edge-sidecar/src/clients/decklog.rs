//! Outbound streaming RPC client to the regional analytics service
//! (`DECKLOG_URL`, spec §4.6, §5, §6).
//!
//! One bidirectional stream is opened per batch: send the batch, half-close,
//! read exactly one acknowledgement. There is no per-batch retry (spec §1
//! non-goals, §7 error kind (c)); a failed or timed-out send simply drops
//! the batch and is logged by the caller.

use std::time::Duration;

use anyhow::{bail, Context as _};
use tonic::transport::{Channel, Endpoint};

use crate::wire::proto::analytics::events_ingest_client::EventsIngestClient;
use crate::wire::proto::analytics::{Ack, Batch};

const SEND_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DecklogClient {
    channel: Channel,
}

impl DecklogClient {
    /// Dials an insecure gRPC channel at startup. Failure here is fatal
    /// (spec §7 error kind (f)): the caller should terminate the process.
    #[tracing::instrument(skip_all)]
    pub async fn connect(authority: &str) -> anyhow::Result<Self> {
        let uri = format!("http://{authority}");
        let endpoint = Endpoint::from_shared(uri).context("invalid DECKLOG_URL")?;
        let channel = endpoint.connect().await.context("failed to dial the analytics channel")?;
        Ok(Self { channel })
    }

    #[tracing::instrument(skip(self, batch), fields(batch_id = %batch.batch_id, events = batch.events.len()))]
    pub async fn send_batch(&self, batch: Batch) -> anyhow::Result<()> {
        let mut client = EventsIngestClient::new(self.channel.clone());

        let outbound = futures::stream::once(async move { batch });
        let request = tonic::Request::new(outbound);

        let call = async {
            let mut inbound = client
                .stream_events(request)
                .await
                .context("failed to open analytics stream")?
                .into_inner();

            let ack: Ack = inbound
                .message()
                .await
                .context("analytics stream closed before an acknowledgement")?
                .context("analytics stream produced no acknowledgement")?;

            if ack.status != "success" {
                bail!("analytics service rejected the batch: {}", ack.status);
            }

            Ok(())
        };

        tokio::time::timeout(SEND_DEADLINE, call)
            .await
            .context("analytics batch send exceeded its deadline")?
    }
}
