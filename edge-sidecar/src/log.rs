use anyhow::Context as _;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard kept alive for the process lifetime; dropping it would stop flushing.
pub struct LoggerGuard;

pub fn init() -> anyhow::Result<LoggerGuard> {
    let env_filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid RUST_LOG filter")?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();

    Ok(LoggerGuard)
}
