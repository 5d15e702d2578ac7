//! Version stat recomputation (PRD-42).
//!
//! Recomputes a version's per-label/per-attribute object counts and
//! frame/object totals from its *current* membership and writes them
//! back onto the version row, clearing the pending flag. Failures are
//! non-fatal: the version simply stays pending and the next trigger
//! (or the pending sweep) tries again.

use std::time::Duration;

use chrono::Utc;

use annolab_core::stats::{fold_label_tallies, LabelTally};
use annolab_core::types::DbId;
use annolab_db::models::dataset_version::UpdateStats;
use annolab_db::repositories::{DatasetVersionRepo, TaskRepo};
use annolab_db::DbPool;

use crate::error::EngineError;

/// What happened to one recompute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// Aggregates were refreshed and the version is no longer pending.
    Completed,
    /// Skipped: the last successful recompute is within the throttle
    /// window.
    Throttled,
    /// The recompute failed; the version stays pending.
    Failed,
}

/// Recomputes version aggregates from current membership.
pub struct StatsRecalculator;

impl StatsRecalculator {
    /// Recompute stats for `version_id`, skipping when the last
    /// successful recompute is younger than `throttle`.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`RecomputeOutcome::Failed`] so that queue consumers and
    /// fire-and-forget callers share one code path.
    pub async fn recompute(
        pool: &DbPool,
        version_id: DbId,
        throttle: Duration,
    ) -> RecomputeOutcome {
        match Self::try_recompute(pool, version_id, throttle).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    version_id,
                    error = %e,
                    "Stats recompute failed; version stays pending"
                );
                RecomputeOutcome::Failed
            }
        }
    }

    async fn try_recompute(
        pool: &DbPool,
        version_id: DbId,
        throttle: Duration,
    ) -> Result<RecomputeOutcome, EngineError> {
        let version = DatasetVersionRepo::find_by_id(pool, version_id)
            .await?
            .ok_or(EngineError::VersionNotFound(version_id))?;

        if let Some(refreshed_at) = version.stats_refreshed_at {
            let age = Utc::now().signed_duration_since(refreshed_at);
            if age < chrono::Duration::from_std(throttle).unwrap_or(chrono::Duration::zero()) {
                tracing::debug!(version_id, "Stats recompute throttled");
                return Ok(RecomputeOutcome::Throttled);
            }
        }

        // Fold the label tallies of every current member task.
        let raw_tallies = TaskRepo::label_tallies_for_version(pool, version_id).await?;
        let mut tallies: Vec<LabelTally> = Vec::new();
        for document in raw_tallies {
            tallies.extend(serde_json::from_value::<Vec<LabelTally>>(document)?);
        }
        let label_stats = fold_label_tallies(tallies.iter());

        let totals = TaskRepo::sum_counts_for_version(pool, version_id).await?;

        let updated = DatasetVersionRepo::update_stats(
            pool,
            version_id,
            &UpdateStats {
                label_stats: serde_json::to_value(&label_stats)?,
                total_frames: totals.frame_count,
                total_objects: totals.object_count,
            },
        )
        .await?;
        if !updated {
            return Err(EngineError::VersionNotFound(version_id));
        }

        tracing::info!(
            version_id,
            labels = label_stats.len(),
            total_frames = totals.frame_count,
            total_objects = totals.object_count,
            "Version stats refreshed"
        );
        Ok(RecomputeOutcome::Completed)
    }
}
