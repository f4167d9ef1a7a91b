//! # Coordinator Runtime
//!
//! The main entry point for the Phase 2 trusted setup coordinator.
//!
//! Initializes telemetry, builds the `CoordinatorContainer` (every
//! ceremony-* service wired against the in-memory adapters), spawns the
//! periodic timeout scan, and serves the HTTP RPC surface until the
//! process receives `SIGINT`.

use anyhow::Result;
use ceremony_api_gateway::CoordinatorService;
use ceremony_telemetry::TelemetryConfig;
use coordinator_runtime::auth::DevAuthenticator;
use coordinator_runtime::container::{CoordinatorContainer, RuntimeConfig};
use coordinator_runtime::timeouts::spawn_timeout_scanner;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let _telemetry_guard = ceremony_telemetry::init_telemetry(telemetry_config).await?;

    info!("===========================================");
    info!("  Phase 2 Trusted Setup Coordinator");
    info!("===========================================");

    let runtime_config = RuntimeConfig::from_env();
    let container = CoordinatorContainer::build(runtime_config);

    let scan_handle = spawn_timeout_scanner(
        Arc::clone(&container.meta_store),
        Arc::clone(&container.scheduler),
        Duration::from_secs(container.config.scheduling.timeout_scan_interval_secs),
    );

    let addr = container.config.gateway.http_addr();
    let authenticator = Arc::new(DevAuthenticator::new(container.config.scheduling.dev_bearer_token.clone()));
    let service = CoordinatorService::new(container.app_state(), authenticator);

    info!(%addr, "coordinator is running, press Ctrl+C to stop");
    service.run(addr).await?;

    scan_handle.abort();
    info!("shut down gracefully");
    Ok(())
}
