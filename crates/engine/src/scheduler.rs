//! Stat-recompute scheduling (PRD-42).
//!
//! [`StatsScheduler`] is a cheap cloneable handle that enqueues
//! recompute jobs; [`StatsQueue`] is the single consumer that drains
//! them. Every enqueue returns a [`CompletionSignal`]: dropping it
//! keeps the historical fire-and-forget behaviour, awaiting it turns
//! the same call into a tracked background job.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use annolab_core::types::DbId;
use annolab_db::DbPool;

use crate::config::EngineConfig;
use crate::stats::{RecomputeOutcome, StatsRecalculator};

struct StatsJob {
    version_id: DbId,
    done: oneshot::Sender<RecomputeOutcome>,
}

// ---------------------------------------------------------------------------
// CompletionSignal
// ---------------------------------------------------------------------------

/// Resolves once the enqueued recompute has run.
pub struct CompletionSignal {
    rx: oneshot::Receiver<RecomputeOutcome>,
}

impl CompletionSignal {
    /// Wait for the job to finish. Returns `None` when the queue shut
    /// down before running the job.
    pub async fn wait(self) -> Option<RecomputeOutcome> {
        self.rx.await.ok()
    }
}

// ---------------------------------------------------------------------------
// StatsScheduler / StatsQueue
// ---------------------------------------------------------------------------

/// Producer handle for the recompute queue.
#[derive(Clone)]
pub struct StatsScheduler {
    tx: mpsc::UnboundedSender<StatsJob>,
}

impl StatsScheduler {
    /// Create a scheduler and the queue that consumes its jobs.
    pub fn new() -> (Self, StatsQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, StatsQueue { rx })
    }

    /// Enqueue a recompute for `version_id`.
    ///
    /// Never blocks. If the queue is already shut down the job is
    /// dropped and the returned signal resolves to `None`.
    pub fn enqueue(&self, version_id: DbId) -> CompletionSignal {
        let (done, rx) = oneshot::channel();
        if self
            .tx
            .send(StatsJob { version_id, done })
            .is_err()
        {
            tracing::warn!(version_id, "Stats queue is closed; recompute dropped");
        }
        CompletionSignal { rx }
    }
}

/// Single consumer of the recompute queue.
pub struct StatsQueue {
    rx: mpsc::UnboundedReceiver<StatsJob>,
}

impl StatsQueue {
    /// Drain the queue against the database until cancelled or all
    /// scheduler handles are gone.
    pub async fn run(self, pool: DbPool, config: EngineConfig, cancel: CancellationToken) {
        let throttle = config.stats_throttle();
        self.run_with(cancel, |version_id| {
            let pool = pool.clone();
            async move { StatsRecalculator::recompute(&pool, version_id, throttle).await }
        })
        .await;
    }

    /// Drain the queue through an arbitrary job handler. Jobs run one
    /// at a time, in enqueue order.
    pub async fn run_with<F, Fut>(mut self, cancel: CancellationToken, mut handler: F)
    where
        F: FnMut(DbId) -> Fut,
        Fut: std::future::Future<Output = RecomputeOutcome>,
    {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Stats queue cancelled");
                    break;
                }
                job = self.rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("All stats scheduler handles dropped; queue stopping");
                        break;
                    };
                    let outcome = handler(job.version_id).await;
                    // The caller may have dropped its signal (fire and
                    // forget); that is not an error.
                    let _ = job.done.send(outcome);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_and_await_completion() {
        let (scheduler, queue) = StatsScheduler::new();
        let cancel = CancellationToken::new();

        let signal = scheduler.enqueue(7);
        drop(scheduler);

        let worker = tokio::spawn(queue.run_with(cancel, |version_id| async move {
            assert_eq!(version_id, 7);
            RecomputeOutcome::Completed
        }));

        assert_eq!(signal.wait().await, Some(RecomputeOutcome::Completed));
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_the_signal_is_fire_and_forget() {
        let (scheduler, queue) = StatsScheduler::new();
        let cancel = CancellationToken::new();

        drop(scheduler.enqueue(1));
        drop(scheduler.enqueue(2));
        drop(scheduler);

        // The queue must process both jobs and exit cleanly even
        // though nobody is listening.
        let processed = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = processed.clone();
        queue
            .run_with(cancel, move |_| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    RecomputeOutcome::Completed
                }
            })
            .await;

        assert_eq!(processed.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn jobs_run_in_enqueue_order() {
        let (scheduler, queue) = StatsScheduler::new();
        let cancel = CancellationToken::new();

        for id in [3, 1, 2] {
            drop(scheduler.enqueue(id));
        }
        drop(scheduler);

        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = order.clone();
        queue
            .run_with(cancel, move |version_id| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(version_id);
                    RecomputeOutcome::Completed
                }
            })
            .await;

        assert_eq!(*order.lock().unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn cancellation_stops_the_queue() {
        let (scheduler, queue) = StatsScheduler::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        queue
            .run_with(cancel, |_| async { RecomputeOutcome::Completed })
            .await;

        // Enqueueing after shutdown resolves the signal to None.
        let signal = scheduler.enqueue(9);
        assert_eq!(signal.wait().await, None);
    }
}
