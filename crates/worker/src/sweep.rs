//! Periodic pending-version sweep.
//!
//! Versions are created pending and only leave that state when a stat
//! recompute succeeds. If a recompute fails (or the process died with
//! jobs queued), nothing would ever retry it, so this loop periodically
//! re-enqueues every pending version. The recompute throttle keeps the
//! sweep from hammering versions that were refreshed moments ago.

use annolab_db::repositories::DatasetVersionRepo;
use annolab_db::DbPool;
use annolab_engine::StatsScheduler;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run the pending sweep loop until cancelled.
pub async fn run(
    pool: DbPool,
    scheduler: StatsScheduler,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Pending sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Pending sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match DatasetVersionRepo::list_pending_ids(&pool).await {
                    Ok(pending) => {
                        if !pending.is_empty() {
                            tracing::info!(count = pending.len(), "Re-enqueueing pending versions");
                        }
                        for version_id in pending {
                            drop(scheduler.enqueue(version_id));
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Pending sweep query failed");
                    }
                }
            }
        }
    }
}
