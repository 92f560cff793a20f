use edge_sidecar::{config::Conf, log, service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger_guard = log::init()?;
    let conf = Conf::from_env()?;

    if let Err(error) = service::run(conf).await {
        tracing::error!(error = format!("{error:#}"), "edge-sidecar exited with an error");
        return Err(error);
    }

    Ok(())
}
