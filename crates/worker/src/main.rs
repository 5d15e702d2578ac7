//! Background worker: runs the stat-recompute queue and the
//! pending-version sweep.

mod sweep;

use annolab_engine::{EngineConfig, StatsScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "annolab_worker=debug,annolab_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = annolab_db::connect(&database_url).await?;
    let config = EngineConfig::from_env();

    let (scheduler, queue) = StatsScheduler::new();
    let cancel = CancellationToken::new();

    tracing::info!(
        stats_throttle_secs = config.stats_throttle_secs,
        pending_sweep_interval_secs = config.pending_sweep_interval_secs,
        "Worker starting"
    );

    let queue_task = tokio::spawn(queue.run(pool.clone(), config.clone(), cancel.clone()));
    let sweep_task = tokio::spawn(sweep::run(
        pool,
        scheduler,
        config.pending_sweep_interval(),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    let _ = tokio::join!(queue_task, sweep_task);
    Ok(())
}
