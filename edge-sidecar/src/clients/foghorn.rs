//! HTTP client for the load balancer service (`FOGHORN_URL`).
//!
//! Spec §6 documents both an RPC and an HTTP form for these calls; we use
//! the HTTP form uniformly so every outbound control-plane client in this
//! crate shares one `reqwest`-based shape (see DESIGN.md).

use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct FoghornClient {
    http: reqwest::Client,
    base_url: Url,
    service_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClipResolution {
    #[serde(default)]
    pub tenant_id: String,
}

#[derive(Debug, Serialize)]
pub struct NodeMetricsUpdate<'a> {
    pub node_id: &'a str,
    pub base_url: &'a str,
    pub healthy: bool,
    pub health_score: u8,
    pub outputs: Option<serde_json::Value>,
}

impl FoghornClient {
    pub fn new(base_url: Url, service_token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build foghorn HTTP client")?;

        Ok(Self {
            http,
            base_url,
            service_token,
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.service_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Resolves a 32-character lowercase-hex VOD clip hash to its tenant
    /// (spec §4.2's secondary resolution path).
    #[tracing::instrument(skip(self))]
    pub async fn resolve_clip_tenant(&self, clip_hash: &str) -> anyhow::Result<String> {
        let url = self
            .base_url
            .join(&format!("/clips/{clip_hash}/tenant"))
            .context("invalid clip tenant URL")?;

        let response = self
            .authed(self.http.get(url).timeout(Duration::from_secs(5)))
            .send()
            .await
            .context("clip tenant resolution request failed")?
            .error_for_status()
            .context("clip tenant resolution returned an error status")?;

        let body: ClipResolution = response.json().await.context("clip tenant response was not valid JSON")?;
        Ok(body.tenant_id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_node_metrics(&self, update: &NodeMetricsUpdate<'_>) -> anyhow::Result<()> {
        let url = self.base_url.join("/node/update").context("invalid node update URL")?;
        self.authed(self.http.post(url))
            .json(update)
            .send()
            .await
            .context("node metrics update request failed")?
            .error_for_status()
            .context("node metrics update returned an error status")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_dvr_stream_end(&self, internal_name: &str, node_id: &str) -> anyhow::Result<()> {
        let url = self
            .base_url
            .join("/dvr/stream-end")
            .context("invalid DVR stream-end URL")?;
        self.authed(self.http.post(url))
            .json(&json!({ "internal_name": internal_name, "node_id": node_id }))
            .send()
            .await
            .context("DVR stream-end request failed")?
            .error_for_status()
            .context("DVR stream-end returned an error status")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_stream_health(&self, internal_name: &str, is_healthy: bool) -> anyhow::Result<()> {
        let url = self.base_url.join("/stream/health").context("invalid stream health URL")?;
        self.authed(self.http.post(url))
            .json(&json!({ "internal_name": internal_name, "is_healthy": is_healthy }))
            .send()
            .await
            .context("stream health update request failed")?
            .error_for_status()
            .context("stream health update returned an error status")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_shutdown(&self, node_id: &str) -> anyhow::Result<()> {
        let url = self.base_url.join("/node/shutdown").context("invalid node shutdown URL")?;
        self.authed(self.http.post(url).timeout(SHUTDOWN_TIMEOUT))
            .json(&json!({ "node_id": node_id }))
            .send()
            .await
            .context("node shutdown notification failed")?
            .error_for_status()
            .context("node shutdown notification returned an error status")?;
        Ok(())
    }
}
