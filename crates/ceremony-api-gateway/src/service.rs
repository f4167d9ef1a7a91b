//! Binds `routes::router` to a TCP listener: the gateway's
//! lifecycle wrapper (construct once, `run` to serve, `ctrl_c`-driven
//! shutdown) around the single HTTP surface this crate exposes.

use crate::domain::config::CoordinatorConfig;
use crate::routes::{self, AppState};
use ceremony_ports::Authenticator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Owns the wired `AppState` and serves it over HTTP until the process is
/// asked to shut down. Background work (the Scheduler's periodic timeout
/// scan) is the caller's responsibility — `coordinator-runtime` spawns it
/// alongside `run`, since it is process wiring, not part of the RPC
/// surface itself.
pub struct CoordinatorService {
    state: AppState,
    authenticator: Arc<dyn Authenticator>,
}

impl CoordinatorService {
    pub fn new(state: AppState, authenticator: Arc<dyn Authenticator>) -> Self {
        Self { state, authenticator }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.state.config
    }

    /// Binds `addr` and serves the RPC surface until the process receives
    /// `SIGINT`/`SIGTERM` (via `tokio::signal::ctrl_c`).
    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let router = routes::router(self.state, self.authenticator);
        info!(%addr, "coordinator RPC surface listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining in-flight requests");
}
