//! Router assembly. Ground: `devolutions-gateway/src/api/mod.rs`'s
//! `make_router` pattern (merge per-concern sub-routers, attach tracing).

mod error;

pub use error::HttpError;

use anyhow::Context as _;
use async_trait::async_trait;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::task::{ShutdownSignal, Task};
use crate::{api, triggers};

pub fn build_router(state: AppState) -> Router<()> {
    Router::new()
        .merge(triggers::router(state.clone()))
        .merge(api::router(state))
        .layer(TraceLayer::new_for_http())
}

pub struct HttpServerTask {
    pub router: Router<()>,
    pub port: u16,
}

#[async_trait]
impl Task for HttpServerTask {
    type Output = anyhow::Result<()>;

    const NAME: &'static str = "http";

    async fn run(self, mut shutdown_signal: ShutdownSignal) -> Self::Output {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port))
            .await
            .context("failed to bind HTTP listener")?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown_signal.wait().await })
            .await
            .context("HTTP server failed")
    }
}
