//! Startup/shutdown orchestration. Ground: `devolutions-gateway/src/service.rs`'s
//! `Tasks` registry (`register::<T: Task>`, `select_all` over join handles)
//! adapted to a single-process async `run()` instead of a Windows service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use futures::future::select_all;

use crate::clients::commodore::CommodoreClient;
use crate::clients::decklog::DecklogClient;
use crate::clients::foghorn::FoghornClient;
use crate::clients::geoip::GeoIpLookup;
use crate::clients::mist_api::MistApiClient;
use crate::config::Conf;
use crate::http::{build_router, HttpServerTask};
use crate::metrics::Metrics;
use crate::node::NodeStore;
use crate::pipeline::{self, BatcherTask};
use crate::poller::PollerTask;
use crate::state::AppState;
use crate::task::{spawn_task, ChildTask, ShutdownHandle, ShutdownSignal, Task};
use crate::tenant::TenantResolver;

struct Tasks {
    inner: Vec<ChildTask<anyhow::Result<()>>>,
    shutdown_handle: Arc<ShutdownHandle>,
    shutdown_signal: ShutdownSignal,
}

impl Tasks {
    fn new() -> Self {
        let (shutdown_handle, shutdown_signal) = ShutdownHandle::new();
        Self {
            inner: Vec::new(),
            shutdown_handle: Arc::new(shutdown_handle),
            shutdown_signal,
        }
    }

    fn register<T>(&mut self, task: T)
    where
        T: Task<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner.push(spawn_task(task, self.shutdown_signal.clone()));
    }
}

/// Builds every subsystem from `conf` and runs until a shutdown signal (a
/// Ctrl-C / SIGTERM or a fatal task failure) arrives.
pub async fn run(conf: Conf) -> anyhow::Result<()> {
    let conf = Arc::new(conf);

    // Fatal per spec §7(e): failure to dial the analytics channel at
    // startup terminates the process.
    let decklog = DecklogClient::connect(&conf.decklog_url)
        .await
        .context("failed to connect to the analytics ingest service")?;

    let commodore = CommodoreClient::new(conf.commodore_url.clone(), conf.service_token.clone())
        .context("failed to build commodore client")?;
    let foghorn = FoghornClient::new(conf.foghorn_url.clone(), conf.service_token.clone())
        .context("failed to build foghorn client")?;
    let mist_api = Arc::new(
        MistApiClient::new(
            conf.mistserver_url.clone(),
            conf.mist_api_username.clone(),
            conf.mist_api_password.clone(),
            conf.mist_password.clone(),
        )
        .context("failed to build control-API client")?,
    );
    let geoip = Arc::new(GeoIpLookup::open(conf.geoip_mmdb_path.as_deref()).context("failed to open geo-IP database")?);
    let tenant_resolver = TenantResolver::new(commodore.clone(), foghorn.clone());
    let node = NodeStore::default();
    let metrics = Metrics::new().context("failed to initialize Prometheus registry")?;

    let (events, consumer) = pipeline::channel(conf.decklog_batch_size);

    let mut tasks = Tasks::new();

    let state = AppState {
        conf: conf.clone(),
        commodore,
        foghorn: foghorn.clone(),
        geoip,
        events: events.clone(),
        node: node.clone(),
        metrics: metrics.clone(),
    };

    tasks.register(HttpServerTask {
        router: build_router(state),
        port: conf.port,
    });

    let shutdown_foghorn = foghorn.clone();
    let shutdown_node = node.clone();

    tasks.register(PollerTask {
        mist_api,
        node,
        events,
        foghorn,
        metrics,
    });

    tasks.register(BatcherTask {
        consumer,
        batch_size: conf.decklog_batch_size,
        decklog,
        tenant_resolver,
    });

    run_until_shutdown(tasks, shutdown_foghorn, shutdown_node).await
}

async fn run_until_shutdown(tasks: Tasks, foghorn: FoghornClient, node: NodeStore) -> anyhow::Result<()> {
    let Tasks {
        inner,
        shutdown_handle,
        ..
    } = tasks;

    let mut join_all = select_all(inner.into_iter().map(|child| Box::pin(child.join())));

    tokio::select! {
        _ = wait_for_termination_signal() => {
            tracing::info!("shutdown signal received");
        }
        (result, _, _rest) = &mut join_all => {
            match result {
                Ok(Ok(())) => tracing::warn!("a task exited gracefully before shutdown was requested"),
                Ok(Err(error)) => tracing::error!(error = format!("{error:#}"), "a task failed"),
                Err(error) => tracing::error!(%error, "a task panicked"),
            }
        }
    }

    // Notify the load balancer before tearing down tasks (spec §6's
    // `POST /node/shutdown`, §1's 2s shutdown-notification deadline).
    if let Some(current_node) = node.get() {
        if let Err(error) = foghorn.send_shutdown(&current_node.node_id).await {
            tracing::warn!(error = format!("{error:#}"), "node shutdown notification failed");
        }
    }

    shutdown_handle.signal();

    tokio::select! {
        () = shutdown_handle.all_closed() => {
            tracing::debug!("all tasks closed gracefully");
        }
        _ = tokio::time::sleep(Duration::from_secs(10)) => {
            tracing::warn!("some tasks did not terminate in time");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
