//! HTTP client for the tenant/stream-key resolution service (`COMMODORE_URL`).
//!
//! Grounded on `devolutions-gateway/src/subscriber.rs`'s `reqwest::Client` +
//! bearer-token POST pattern, adapted to a handful of GET/POST calls.

use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct CommodoreClient {
    http: reqwest::Client,
    base_url: Url,
    service_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResolveInternalNameResponse {
    #[serde(default)]
    tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamKeyValidation {
    pub valid: bool,
    #[serde(default)]
    pub internal_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackResolution {
    #[serde(default)]
    pub internal_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl CommodoreClient {
    pub fn new(base_url: Url, service_token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build commodore HTTP client")?;

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

    /// GET the tenant owning `internal_name`. Returns an empty string on any
    /// failure; the caller decides whether to cache (spec §4.2: failures are
    /// not cached).
    #[tracing::instrument(skip(self))]
    pub async fn resolve_internal_name(&self, internal_name: &str) -> anyhow::Result<String> {
        let url = self
            .base_url
            .join(&format!("/internal-names/{internal_name}/tenant"))
            .context("invalid resolve-internal-name URL")?;

        let response = self
            .authed(self.http.get(url))
            .send()
            .await
            .context("resolve-internal-name request failed")?
            .error_for_status()
            .context("resolve-internal-name returned an error status")?;

        let body: ResolveInternalNameResponse = response
            .json()
            .await
            .context("resolve-internal-name response was not valid JSON")?;

        Ok(body.tenant_id)
    }

    #[tracing::instrument(skip(self, push_url, host))]
    pub async fn validate_stream_key(
        &self,
        push_url: &str,
        host: &str,
        stream_key: &str,
    ) -> anyhow::Result<StreamKeyValidation> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            push_url: &'a str,
            host: &'a str,
            stream_key: &'a str,
        }

        let url = self.base_url.join("/stream-keys/validate").context("invalid validate URL")?;

        let response = self
            .authed(self.http.post(url))
            .json(&Request {
                push_url,
                host,
                stream_key,
            })
            .send()
            .await
            .context("stream-key validation request failed")?
            .error_for_status()
            .context("stream-key validation returned an error status")?;

        response.json().await.context("stream-key validation response was not valid JSON")
    }

    #[tracing::instrument(skip(self, viewer_host, request_url))]
    pub async fn resolve_playback_id(
        &self,
        playback_id: &str,
        viewer_host: &str,
        request_url: Option<&str>,
    ) -> anyhow::Result<PlaybackResolution> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            playback_id: &'a str,
            viewer_host: &'a str,
            request_url: Option<&'a str>,
        }

        let url = self
            .base_url
            .join("/playback-ids/resolve")
            .context("invalid resolve-playback-id URL")?;

        let response = self
            .authed(self.http.post(url))
            .json(&Request {
                playback_id,
                viewer_host,
                request_url,
            })
            .send()
            .await
            .context("playback-id resolution request failed")?
            .error_for_status()
            .context("playback-id resolution returned an error status")?;

        response
            .json()
            .await
            .context("playback-id resolution response was not valid JSON")
    }
}
