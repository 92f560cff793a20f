//! Configuration loaded once from the environment at process startup.
//!
//! Unlike `devolutions-gateway`'s `config.rs`, there is no config file and no
//! hot-reload path here (spec §6: "Persisted state layout: None at the core
//! level"). `Conf` is assembled once and shared behind an `Arc`.

use std::collections::HashMap;
use std::env;

use anyhow::{Context as _, Result};
use url::Url;

const DEFAULT_MIST_PASSWORD: &str = "koekjes";
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Conf {
    pub mistserver_url: Url,
    pub mist_api_username: String,
    pub mist_api_password: String,
    pub mist_password: String,
    pub commodore_url: Url,
    pub foghorn_url: Url,
    pub decklog_url: String,
    pub decklog_batch_size: usize,
    pub geoip_mmdb_path: Option<String>,
    pub service_token: Option<String>,
    pub node_name: Option<String>,
    pub cluster_id: Option<String>,
    pub capabilities: HashMap<String, String>,
    pub port: u16,
}

impl Conf {
    pub fn from_env() -> Result<Self> {
        let mistserver_url = required_url("MISTSERVER_URL")?;
        let commodore_url = required_url("COMMODORE_URL")?;
        let foghorn_url = required_url("FOGHORN_URL")?;

        let decklog_url = env::var("DECKLOG_URL").context("DECKLOG_URL is required")?;
        // The gRPC transport dials a scheme-less authority; strip one if present.
        let decklog_url = decklog_url
            .strip_prefix("https://")
            .or_else(|| decklog_url.strip_prefix("http://"))
            .unwrap_or(&decklog_url)
            .to_owned();

        let decklog_batch_size = env::var("DECKLOG_BATCH_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mut capabilities = HashMap::new();
        for (key, value) in env::vars() {
            if key.starts_with("HELMSMAN_") {
                capabilities.insert(key, value);
            }
        }

        Ok(Self {
            mistserver_url,
            mist_api_username: env::var("MIST_API_USERNAME").unwrap_or_default(),
            mist_api_password: env::var("MIST_API_PASSWORD").unwrap_or_default(),
            mist_password: env::var("MIST_PASSWORD").unwrap_or_else(|_| DEFAULT_MIST_PASSWORD.to_owned()),
            commodore_url,
            foghorn_url,
            decklog_url,
            decklog_batch_size,
            geoip_mmdb_path: env::var("GEOIP_MMDB_PATH").ok(),
            service_token: env::var("SERVICE_TOKEN").ok(),
            node_name: env::var("NODE_NAME").ok(),
            cluster_id: env::var("CLUSTER_ID").ok(),
            capabilities,
            port,
        })
    }
}

fn required_url(var: &str) -> Result<Url> {
    let raw = env::var(var).with_context(|| format!("{var} is required"))?;
    Url::parse(&raw).with_context(|| format!("{var} is not a valid URL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_from_decklog_url() {
        let url = "https://decklog.internal:4317".to_owned();
        let stripped = url.strip_prefix("https://").unwrap_or(&url);
        assert_eq!(stripped, "decklog.internal:4317");
    }
}
