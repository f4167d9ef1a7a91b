//! Periodic timeout scan: `Scheduler::enforce_timeouts` only
//! knows how to sweep a single ceremony's circuits, so the process-level
//! loop is the thing that fans it out across every open ceremony on a
//! fixed tick.

use ceremony_ports::MetaStore;
use ceremony_scheduler::Scheduler;
use shared_types::CeremonyState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Spawns a background task that scans every `Opened` ceremony every
/// `interval` and fires timeouts on any participant past its deadline.
/// Returns the task's `JoinHandle` so the caller can await it at shutdown.
pub fn spawn_timeout_scanner(
    meta_store: Arc<dyn MetaStore>,
    scheduler: Arc<Scheduler>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = scan_once(&meta_store, &scheduler).await {
                error!(%err, "timeout scan pass failed");
            }
        }
    })
}

async fn scan_once(meta_store: &Arc<dyn MetaStore>, scheduler: &Arc<Scheduler>) -> Result<(), ceremony_ports::CoreError> {
    let ceremonies = meta_store.list_ceremonies().await?;
    for ceremony in ceremonies {
        if ceremony.state != CeremonyState::Opened {
            continue;
        }
        match scheduler.enforce_timeouts(&ceremony.id).await {
            Ok(timed_out) if !timed_out.is_empty() => {
                info!(ceremony_id = ?ceremony.id, count = timed_out.len(), "timed out participants");
            }
            Ok(_) => {}
            Err(err) => warn!(ceremony_id = ?ceremony.id, %err, "timeout enforcement failed for ceremony"),
        }
    }
    Ok(())
}
