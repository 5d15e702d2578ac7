//! Dataset version lifecycle (PRD-40).
//!
//! [`VersionManager`] owns the create / edit / delete flow for dataset
//! versions: it runs the split allocator, persists version rows, keeps
//! the owning group's version list linked, fans membership tags out
//! through the [`TagPropagator`], and enqueues stat recomputes.
//!
//! The version row and the membership fan-out are deliberately not
//! covered by one transaction. Once the row is persisted, propagation
//! or recompute failures leave the version pending instead of rolling
//! it back; re-running the same edit converges because every membership
//! operation is idempotent per id. Concurrent edits to the same version
//! are not serialized.

use std::collections::{HashMap, HashSet};

use annolab_core::bucket::{BucketTasks, BucketType, SplitCount, BUCKET_COUNT, BUCKET_ORDER};
use annolab_core::split::{allocate, manual_split_counts, SplitPercentages, TaskWeight};
use annolab_core::types::DbId;
use annolab_core::version::{next_version_number as next_number, CreationMode, VersionType};
use annolab_core::VersionNumber;
use annolab_db::models::dataset_version::{CreateDatasetVersion, UpdateSplit};
use annolab_db::repositories::{
    DatasetGroupRepo, DatasetVersionRepo, TaskMembershipRepo, TaskRepo,
};
use annolab_db::DbPool;

use crate::error::EngineError;
use crate::propagation::TagPropagator;
use crate::scheduler::StatsScheduler;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// The task pool supplied to a create or edit call.
///
/// The engine performs no eligibility filtering: callers supply only
/// tasks in an accepted quality state, and for [`TaskPool::Random`] the
/// list order is the assignment order.
#[derive(Debug, Clone)]
pub enum TaskPool {
    /// Let the allocator partition the pool.
    Random(Vec<TaskWeight>),
    /// Caller-fixed per-bucket task lists, in bucket order.
    Manual([Vec<DbId>; BUCKET_COUNT]),
}

impl TaskPool {
    fn mode(&self) -> CreationMode {
        match self {
            Self::Random(_) => CreationMode::Random,
            Self::Manual(_) => CreationMode::Manual,
        }
    }
}

/// A label-set or augmentation-settings change applied to a version.
#[derive(Debug, Clone)]
pub enum SettingsChange {
    Labels(serde_json::Value),
    Augmentation(serde_json::Value),
}

/// Result of a version delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// True when the deleted version was its group's last one and the
    /// group was removed with it.
    pub deleted_group: bool,
}

/// A resolved split assignment ready to persist.
struct Assignment {
    mode: CreationMode,
    split_counts: Vec<SplitCount>,
    buckets: Vec<BucketTasks>,
}

impl Assignment {
    /// Full membership: bucket order, pool order within a bucket.
    fn all_task_ids(&self) -> Vec<DbId> {
        self.buckets
            .iter()
            .flat_map(|b| b.task_ids.iter().copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// VersionManager
// ---------------------------------------------------------------------------

/// Owns the dataset-version lifecycle and orchestrates allocation, tag
/// propagation, and stat recomputes.
pub struct VersionManager {
    pool: DbPool,
    stats: StatsScheduler,
}

impl VersionManager {
    pub fn new(pool: DbPool, stats: StatsScheduler) -> Self {
        Self { pool, stats }
    }

    /// The scheduler handle, for callers that want to await a
    /// recompute instead of firing and forgetting.
    pub fn stats(&self) -> &StatsScheduler {
        &self.stats
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Create a new version in `group_id` from the supplied task pool.
    ///
    /// The first version of a group is numbered `1.0.1` and tagged as
    /// the start version; later ones get the next number and count as
    /// edits. The new version starts pending until its first stat
    /// recompute lands.
    pub async fn create_version(
        &self,
        group_id: DbId,
        task_pool: TaskPool,
        pct: &SplitPercentages,
    ) -> Result<DbId, EngineError> {
        pct.validate()?;
        if DatasetGroupRepo::find_by_id(&self.pool, group_id)
            .await?
            .is_none()
        {
            return Err(EngineError::GroupNotFound(group_id));
        }

        let assignment = self.resolve_assignment(&task_pool, pct).await?;

        let existing = DatasetVersionRepo::list_version_numbers(&self.pool, group_id).await?;
        let version_type = if existing.is_empty() {
            VersionType::Start
        } else {
            VersionType::Edit
        };
        let version_no = next_number(existing.iter().map(String::as_str))?;

        let version = DatasetVersionRepo::create(
            &self.pool,
            &CreateDatasetVersion {
                group_id,
                version_no: version_no.to_string(),
                creation_mode: assignment.mode.as_i16(),
                version_type: version_type.as_i16(),
                split_counts: serde_json::to_value(&assignment.split_counts)?,
                task_ids: assignment.all_task_ids(),
                split_tasks: serde_json::to_value(&assignment.buckets)?,
                labels: None,
                augmentations: None,
            },
        )
        .await?;

        DatasetGroupRepo::append_version(&self.pool, group_id, version.id).await?;
        self.attach_buckets(version.id, &assignment.buckets).await;
        self.trigger_recompute(version.id);

        tracing::info!(
            group_id,
            version_id = version.id,
            version_no = %version_no,
            tasks = version.task_ids.len(),
            "Dataset version created"
        );
        Ok(version.id)
    }

    // ── Edit ─────────────────────────────────────────────────────────

    /// Re-split a version against a new task pool.
    ///
    /// With `as_new_version`, the version's metadata is cloned under
    /// the next version number and the whole assignment is attached
    /// under the fresh id. In place, the new assignment is diffed
    /// against the current membership: moved tasks are retagged, new
    /// ones attached, removed ones detached. Either way the version
    /// goes back to pending and a recompute is enqueued.
    pub async fn edit_version(
        &self,
        version_id: DbId,
        task_pool: TaskPool,
        pct: &SplitPercentages,
        as_new_version: bool,
    ) -> Result<DbId, EngineError> {
        pct.validate()?;
        let version = DatasetVersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or(EngineError::VersionNotFound(version_id))?;

        let assignment = self.resolve_assignment(&task_pool, pct).await?;

        if as_new_version {
            let version_no = self.next_version_number(version.group_id).await?;
            let new_version = DatasetVersionRepo::create(
                &self.pool,
                &CreateDatasetVersion {
                    group_id: version.group_id,
                    version_no: version_no.to_string(),
                    creation_mode: assignment.mode.as_i16(),
                    version_type: VersionType::Edit.as_i16(),
                    split_counts: serde_json::to_value(&assignment.split_counts)?,
                    task_ids: assignment.all_task_ids(),
                    split_tasks: serde_json::to_value(&assignment.buckets)?,
                    labels: version.labels.clone(),
                    augmentations: version.augmentations.clone(),
                },
            )
            .await?;

            DatasetGroupRepo::append_version(&self.pool, version.group_id, new_version.id)
                .await?;
            // Fresh id: everything is an attach, no diffing needed.
            self.attach_buckets(new_version.id, &assignment.buckets).await;
            self.trigger_recompute(new_version.id);

            tracing::info!(
                version_id,
                new_version_id = new_version.id,
                version_no = %version_no,
                "Dataset version edited as new version"
            );
            return Ok(new_version.id);
        }

        let previous: HashMap<DbId, BucketType> =
            TaskMembershipRepo::list_by_version(&self.pool, version_id)
                .await?
                .into_iter()
                .filter_map(|m| BucketType::from_i16(m.bucket).map(|b| (m.task_id, b)))
                .collect();
        let diff = diff_assignments(&previous, &assignment.buckets);

        DatasetVersionRepo::update_split(
            &self.pool,
            version_id,
            &UpdateSplit {
                split_counts: serde_json::to_value(&assignment.split_counts)?,
                task_ids: assignment.all_task_ids(),
                split_tasks: serde_json::to_value(&assignment.buckets)?,
                version_type: VersionType::Edit.as_i16(),
            },
        )
        .await?
        .ok_or(EngineError::VersionNotFound(version_id))?;

        self.apply_diff(version_id, &diff).await;
        self.trigger_recompute(version_id);

        tracing::info!(
            version_id,
            attached = diff.attach.iter().map(Vec::len).sum::<usize>(),
            retagged = diff.retag.iter().map(Vec::len).sum::<usize>(),
            detached = diff.detach.len(),
            "Dataset version edited in place"
        );
        Ok(version_id)
    }

    /// Re-balance a version across its *current* members.
    ///
    /// Convenience wrapper over an in-place [`edit_version`]: the pool
    /// is the version's current membership, ordered by task id so the
    /// allocator sees a reproducible ordering.
    ///
    /// [`edit_version`]: Self::edit_version
    pub async fn rebalance(
        &self,
        version_id: DbId,
        pct: &SplitPercentages,
    ) -> Result<DbId, EngineError> {
        let weights: Vec<TaskWeight> =
            TaskRepo::list_counts_for_version(&self.pool, version_id)
                .await?
                .into_iter()
                .map(|c| TaskWeight {
                    id: c.id,
                    object_count: c.object_count,
                    frame_count: c.frame_count,
                })
                .collect();
        self.edit_version(version_id, TaskPool::Random(weights), pct, false)
            .await
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Apply a label-set or augmentation-settings change.
    ///
    /// In place, the field is replaced and the version re-enters the
    /// pending state. As a new version, the row is cloned under the
    /// next number with the changed field, and the existing membership
    /// is re-attached under the fresh id.
    pub async fn apply_settings(
        &self,
        version_id: DbId,
        change: SettingsChange,
        as_new_version: bool,
    ) -> Result<DbId, EngineError> {
        if !as_new_version {
            let updated = match &change {
                SettingsChange::Labels(value) => {
                    DatasetVersionRepo::update_labels(
                        &self.pool,
                        version_id,
                        value,
                        VersionType::Label.as_i16(),
                    )
                    .await?
                }
                SettingsChange::Augmentation(value) => {
                    DatasetVersionRepo::update_augmentations(
                        &self.pool,
                        version_id,
                        value,
                        VersionType::Augmentation.as_i16(),
                    )
                    .await?
                }
            };
            updated.ok_or(EngineError::VersionNotFound(version_id))?;
            self.trigger_recompute(version_id);
            return Ok(version_id);
        }

        let version = DatasetVersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or(EngineError::VersionNotFound(version_id))?;
        let version_no = self.next_version_number(version.group_id).await?;

        let (labels, augmentations, version_type) = match change {
            SettingsChange::Labels(value) => {
                (Some(value), version.augmentations.clone(), VersionType::Label)
            }
            SettingsChange::Augmentation(value) => {
                (version.labels.clone(), Some(value), VersionType::Augmentation)
            }
        };

        let new_version = DatasetVersionRepo::create(
            &self.pool,
            &CreateDatasetVersion {
                group_id: version.group_id,
                version_no: version_no.to_string(),
                creation_mode: version.creation_mode,
                version_type: version_type.as_i16(),
                split_counts: version.split_counts.clone(),
                task_ids: version.task_ids.clone(),
                split_tasks: version.split_tasks.clone(),
                labels,
                augmentations,
            },
        )
        .await?;

        DatasetGroupRepo::append_version(&self.pool, version.group_id, new_version.id).await?;

        // The membership carries over verbatim; attach it under the
        // fresh id.
        let buckets: Vec<BucketTasks> = serde_json::from_value(version.split_tasks.clone())?;
        self.attach_buckets(new_version.id, &buckets).await;
        self.trigger_recompute(new_version.id);

        tracing::info!(
            version_id,
            new_version_id = new_version.id,
            version_no = %version_no,
            "Settings change saved as new version"
        );
        Ok(new_version.id)
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Delete a version, cascading tag removal to all member tasks and
    /// frames. Deleting a group's last version deletes the group.
    ///
    /// Tag removal must complete before the row goes away; a partial
    /// propagation failure aborts the delete and is safe to retry.
    pub async fn delete_version(&self, version_id: DbId) -> Result<DeleteOutcome, EngineError> {
        let version = DatasetVersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or(EngineError::VersionNotFound(version_id))?;
        let group_id = version.group_id;
        let remaining = DatasetGroupRepo::count_versions(&self.pool, group_id).await?;

        TagPropagator::detach(&self.pool, &version.task_ids, version_id).await?;
        DatasetVersionRepo::delete(&self.pool, version_id).await?;

        let deleted_group = if remaining <= 1 {
            DatasetGroupRepo::delete(&self.pool, group_id).await?;
            true
        } else {
            DatasetGroupRepo::remove_version(&self.pool, group_id, version_id).await?;
            false
        };

        tracing::info!(
            version_id,
            group_id,
            deleted_group,
            tasks = version.task_ids.len(),
            "Dataset version deleted"
        );
        Ok(DeleteOutcome { deleted_group })
    }

    // ── Version numbering ────────────────────────────────────────────

    /// The number the group's next version will get: the highest
    /// existing `(major, minor, patch)` triple bumped with rollover at
    /// 10, or `1.0.1` for a group with no versions yet.
    pub async fn next_version_number(
        &self,
        group_id: DbId,
    ) -> Result<VersionNumber, EngineError> {
        if DatasetGroupRepo::find_by_id(&self.pool, group_id)
            .await?
            .is_none()
        {
            return Err(EngineError::GroupNotFound(group_id));
        }
        let numbers = DatasetVersionRepo::list_version_numbers(&self.pool, group_id).await?;
        Ok(next_number(numbers.iter().map(String::as_str))?)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Turn a task pool into a persisted-ready assignment. Reads task
    /// counts for manual pools; performs no writes.
    async fn resolve_assignment(
        &self,
        task_pool: &TaskPool,
        pct: &SplitPercentages,
    ) -> Result<Assignment, EngineError> {
        match task_pool {
            TaskPool::Random(weights) => {
                let outcome = allocate(weights, pct)?;
                Ok(Assignment {
                    mode: CreationMode::Random,
                    split_counts: outcome.split_counts(),
                    buckets: outcome
                        .buckets
                        .iter()
                        .map(|b| BucketTasks {
                            bucket: b.bucket,
                            task_ids: b.task_ids.clone(),
                        })
                        .collect(),
                })
            }
            TaskPool::Manual(lists) => {
                let mut weights: [Vec<TaskWeight>; BUCKET_COUNT] = Default::default();
                for bucket in BUCKET_ORDER {
                    let index = bucket.index();
                    weights[index] = TaskRepo::list_counts(&self.pool, &lists[index])
                        .await?
                        .into_iter()
                        .map(|c| TaskWeight {
                            id: c.id,
                            object_count: c.object_count,
                            frame_count: c.frame_count,
                        })
                        .collect();
                }
                let split_counts = manual_split_counts(&weights, pct)?;
                Ok(Assignment {
                    mode: task_pool.mode(),
                    split_counts,
                    buckets: BUCKET_ORDER
                        .iter()
                        .map(|&bucket| BucketTasks {
                            bucket,
                            task_ids: lists[bucket.index()].clone(),
                        })
                        .collect(),
                })
            }
        }
    }

    /// Attach every bucket of an assignment under `version_id`.
    ///
    /// Propagation failures are logged, not returned: the version row
    /// is already persisted and stays pending until a retry converges.
    async fn attach_buckets(&self, version_id: DbId, buckets: &[BucketTasks]) {
        for bucket_tasks in buckets {
            if bucket_tasks.task_ids.is_empty() {
                continue;
            }
            if let Err(e) = TagPropagator::attach(
                &self.pool,
                &bucket_tasks.task_ids,
                version_id,
                bucket_tasks.bucket,
            )
            .await
            {
                tracing::error!(
                    version_id,
                    bucket = ?bucket_tasks.bucket,
                    error = %e,
                    "Tag attach incomplete; version stays pending until retried"
                );
            }
        }
    }

    /// Apply a membership diff: attach and retag per bucket, then
    /// detach removed tasks. Same failure policy as
    /// [`attach_buckets`](Self::attach_buckets).
    async fn apply_diff(&self, version_id: DbId, diff: &MembershipDiff) {
        for bucket in BUCKET_ORDER {
            let index = bucket.index();
            if !diff.attach[index].is_empty() {
                if let Err(e) =
                    TagPropagator::attach(&self.pool, &diff.attach[index], version_id, bucket)
                        .await
                {
                    tracing::error!(version_id, bucket = ?bucket, error = %e, "Tag attach incomplete");
                }
            }
            if !diff.retag[index].is_empty() {
                if let Err(e) =
                    TagPropagator::retag(&self.pool, &diff.retag[index], version_id, bucket)
                        .await
                {
                    tracing::error!(version_id, bucket = ?bucket, error = %e, "Tag retag incomplete");
                }
            }
        }
        if !diff.detach.is_empty() {
            if let Err(e) = TagPropagator::detach(&self.pool, &diff.detach, version_id).await {
                tracing::error!(version_id, error = %e, "Tag detach incomplete");
            }
        }
    }

    /// Fire-and-forget recompute trigger; callers that want the
    /// tracked variant enqueue through [`stats`](Self::stats) and keep
    /// the signal.
    fn trigger_recompute(&self, version_id: DbId) {
        drop(self.stats.enqueue(version_id));
    }
}

// ---------------------------------------------------------------------------
// Membership diffing
// ---------------------------------------------------------------------------

/// The tag operations needed to move the stored membership onto a new
/// assignment.
#[derive(Debug, Default, PartialEq, Eq)]
struct MembershipDiff {
    /// Tasks to attach, per bucket.
    attach: [Vec<DbId>; BUCKET_COUNT],
    /// Tasks whose tag moves to a different bucket, per target bucket.
    retag: [Vec<DbId>; BUCKET_COUNT],
    /// Tasks no longer in any bucket, in ascending id order.
    detach: Vec<DbId>,
}

impl MembershipDiff {
    fn is_empty(&self) -> bool {
        self.attach.iter().all(Vec::is_empty)
            && self.retag.iter().all(Vec::is_empty)
            && self.detach.is_empty()
    }
}

/// Diff a target assignment against the membership currently on
/// record. Tasks keeping their bucket need no operation at all, which
/// is what makes a repeated identical edit a no-op on the tag stores.
fn diff_assignments(
    previous: &HashMap<DbId, BucketType>,
    target: &[BucketTasks],
) -> MembershipDiff {
    let mut diff = MembershipDiff::default();
    let mut assigned: HashSet<DbId> = HashSet::new();

    for bucket_tasks in target {
        let index = bucket_tasks.bucket.index();
        for &task_id in &bucket_tasks.task_ids {
            assigned.insert(task_id);
            match previous.get(&task_id) {
                None => diff.attach[index].push(task_id),
                Some(prev) if *prev != bucket_tasks.bucket => diff.retag[index].push(task_id),
                Some(_) => {}
            }
        }
    }

    diff.detach = previous
        .keys()
        .filter(|id| !assigned.contains(id))
        .copied()
        .collect();
    diff.detach.sort_unstable();
    diff
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(training: &[DbId], validation: &[DbId], testing: &[DbId]) -> Vec<BucketTasks> {
        vec![
            BucketTasks {
                bucket: BucketType::Training,
                task_ids: training.to_vec(),
            },
            BucketTasks {
                bucket: BucketType::Validation,
                task_ids: validation.to_vec(),
            },
            BucketTasks {
                bucket: BucketType::Testing,
                task_ids: testing.to_vec(),
            },
        ]
    }

    fn membership(entries: &[(DbId, BucketType)]) -> HashMap<DbId, BucketType> {
        entries.iter().copied().collect()
    }

    #[test]
    fn identical_assignment_diffs_to_nothing() {
        let previous = membership(&[
            (1, BucketType::Training),
            (2, BucketType::Validation),
            (3, BucketType::Testing),
        ]);
        let diff = diff_assignments(&previous, &buckets(&[1], &[2], &[3]));
        assert!(diff.is_empty(), "repeating an edit must be a tag no-op");
    }

    #[test]
    fn fresh_assignment_is_all_attaches() {
        let diff = diff_assignments(&HashMap::new(), &buckets(&[1, 2], &[3], &[4]));
        assert_eq!(diff.attach[0], vec![1, 2]);
        assert_eq!(diff.attach[1], vec![3]);
        assert_eq!(diff.attach[2], vec![4]);
        assert!(diff.retag.iter().all(Vec::is_empty));
        assert!(diff.detach.is_empty());
    }

    #[test]
    fn moved_task_is_retagged_not_reattached() {
        let previous = membership(&[(1, BucketType::Training), (2, BucketType::Training)]);
        let diff = diff_assignments(&previous, &buckets(&[1], &[2], &[]));
        assert!(diff.attach.iter().all(Vec::is_empty));
        assert_eq!(diff.retag[1], vec![2], "task 2 moved training -> validation");
        assert!(diff.detach.is_empty());
    }

    #[test]
    fn removed_task_is_detached() {
        let previous = membership(&[(1, BucketType::Training), (9, BucketType::Testing)]);
        let diff = diff_assignments(&previous, &buckets(&[1], &[], &[]));
        assert_eq!(diff.detach, vec![9]);
    }

    #[test]
    fn mixed_edit_classifies_every_task_once() {
        let previous = membership(&[
            (1, BucketType::Training),
            (2, BucketType::Training),
            (3, BucketType::Validation),
            (4, BucketType::Testing),
        ]);
        // 1 stays, 2 moves to testing, 3 is removed, 5 is new.
        let diff = diff_assignments(&previous, &buckets(&[1, 5], &[4], &[2]));

        assert_eq!(diff.attach[0], vec![5]);
        assert_eq!(diff.retag[1], vec![4], "4 moved testing -> validation");
        assert_eq!(diff.retag[2], vec![2], "2 moved training -> testing");
        assert_eq!(diff.detach, vec![3]);
    }

    #[test]
    fn applying_a_diff_then_rediffing_is_empty() {
        let previous = membership(&[(1, BucketType::Training), (2, BucketType::Validation)]);
        let target = buckets(&[1, 3], &[], &[2]);

        // Simulate applying the diff onto the membership map.
        let diff = diff_assignments(&previous, &target);
        let mut applied = previous.clone();
        for bucket in BUCKET_ORDER {
            let index = bucket.index();
            for &id in &diff.attach[index] {
                applied.insert(id, bucket);
            }
            for &id in &diff.retag[index] {
                applied.insert(id, bucket);
            }
        }
        for id in &diff.detach {
            applied.remove(id);
        }

        assert!(diff_assignments(&applied, &target).is_empty());
    }
}
