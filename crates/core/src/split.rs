//! Greedy training/validation/testing split allocator (PRD-41).
//!
//! [`allocate`] partitions an ordered pool of tasks into the three
//! dataset buckets so that each bucket's object count lands as close as
//! possible to a caller-supplied percentage of the total.
//!
//! The algorithm is a single left-to-right pass: a bucket consumes tasks
//! from the front of the remaining pool until the next task would
//! overshoot its target, admits that task anyway when overshooting is
//! the smaller error, and otherwise leaves it for the next bucket. The
//! testing bucket admits every task that remains. There is no
//! backtracking across buckets; the pass is locally greedy, not a global
//! optimum, and that is the intended contract.
//!
//! The result is a deterministic function of the input *order*: the same
//! tasks in a different order produce a different assignment. Callers
//! must supply a stable, reproducible ordering.

use serde::{Deserialize, Serialize};

use crate::bucket::{BucketType, SplitCount, BUCKET_COUNT, BUCKET_ORDER};
use crate::error::CoreError;
use crate::types::DbId;

/// Maximum deviation from 100 tolerated when validating a percentage
/// triple.
pub const PERCENT_SUM_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The per-task counts the allocator works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWeight {
    pub id: DbId,
    pub object_count: i64,
    pub frame_count: i64,
}

/// Requested share of the total object count per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPercentages {
    pub training: f64,
    pub validation: f64,
    pub testing: f64,
}

impl SplitPercentages {
    /// Reject negative components and triples that do not sum to 100
    /// (within [`PERCENT_SUM_TOLERANCE`]).
    pub fn validate(&self) -> Result<(), CoreError> {
        for (value, name) in [
            (self.training, "training"),
            (self.validation, "validation"),
            (self.testing, "testing"),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(CoreError::InvalidPercentages(format!(
                    "{name} percentage must be non-negative, got {value}"
                )));
            }
        }
        let sum = self.training + self.validation + self.testing;
        if (sum - 100.0).abs() > PERCENT_SUM_TOLERANCE {
            return Err(CoreError::InvalidPercentages(format!(
                "percentages must sum to 100, got {sum}"
            )));
        }
        Ok(())
    }

    /// Per-bucket object-count targets for a pool totalling
    /// `total_objects`.
    fn targets(&self, total_objects: i64) -> [i64; BUCKET_COUNT] {
        let total = total_objects as f64;
        [
            (total * self.training / 100.0).round() as i64,
            (total * self.validation / 100.0).round() as i64,
            (total * self.testing / 100.0).round() as i64,
        ]
    }

    fn by_index(&self, index: usize) -> f64 {
        [self.training, self.validation, self.testing][index]
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// One bucket's share of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAllocation {
    pub bucket: BucketType,
    pub task_ids: Vec<DbId>,
    /// Summed frame count of the assigned tasks.
    pub image_count: i64,
    /// Summed object count of the assigned tasks.
    pub object_count: i64,
    /// Achieved share of the total object count, rounded to a whole
    /// percent.
    pub percentage: i64,
}

/// The full result of one allocation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub buckets: [BucketAllocation; BUCKET_COUNT],
    pub total_objects: i64,
}

impl SplitOutcome {
    /// Per-bucket aggregate counts, in bucket order.
    pub fn split_counts(&self) -> Vec<SplitCount> {
        self.buckets
            .iter()
            .map(|b| SplitCount {
                bucket: b.bucket,
                image_count: b.image_count,
                object_count: b.object_count,
                percentage: b.percentage,
            })
            .collect()
    }

    /// All assigned task ids in bucket order, then pool order within a
    /// bucket.
    pub fn all_task_ids(&self) -> Vec<DbId> {
        self.buckets
            .iter()
            .flat_map(|b| b.task_ids.iter().copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Partition `tasks` (in the given order) into the three buckets.
///
/// Fails with [`CoreError::InvalidPercentages`] before any other work
/// when the triple is malformed, and with [`CoreError::EmptyWorkingSet`]
/// when the pool carries no annotated objects at all.
pub fn allocate(
    tasks: &[TaskWeight],
    pct: &SplitPercentages,
) -> Result<SplitOutcome, CoreError> {
    pct.validate()?;

    let total_objects: i64 = tasks.iter().map(|t| t.object_count).sum();
    if total_objects <= 0 {
        return Err(CoreError::EmptyWorkingSet);
    }

    let targets = pct.targets(total_objects);
    let mut remaining = tasks;

    let buckets = BUCKET_ORDER.map(|bucket| {
        let index = bucket.index();
        let last = index == BUCKET_COUNT - 1;
        let target = targets[index];

        let mut task_ids: Vec<DbId> = Vec::new();
        let mut object_count: i64 = 0;
        let mut image_count: i64 = 0;

        for task in remaining {
            let projected = object_count + task.object_count;
            if projected <= target {
                // Still under target: keep filling.
                task_ids.push(task.id);
                object_count = projected;
                image_count += task.frame_count;
                continue;
            }

            // This task would overshoot. Admit it when overshooting is
            // the smaller error; the testing bucket admits everything
            // that remains.
            let overshoot = projected - target;
            let undershoot = target - object_count;
            if last || overshoot < undershoot {
                task_ids.push(task.id);
                object_count = projected;
                image_count += task.frame_count;
                if !last {
                    break;
                }
            } else {
                break;
            }
        }

        remaining = &remaining[task_ids.len()..];

        BucketAllocation {
            bucket,
            percentage: (object_count as f64 * 100.0 / total_objects as f64).round() as i64,
            task_ids,
            image_count,
            object_count,
        }
    });

    Ok(SplitOutcome {
        buckets,
        total_objects,
    })
}

/// Aggregate counts for caller-fixed per-bucket pools (manual splits).
///
/// No re-assignment happens: each bucket keeps the tasks it was given,
/// and the reported percentage is the *requested* share, mirroring what
/// a manual split promises rather than what the counts work out to.
pub fn manual_split_counts(
    buckets: &[Vec<TaskWeight>; BUCKET_COUNT],
    pct: &SplitPercentages,
) -> Result<Vec<SplitCount>, CoreError> {
    pct.validate()?;

    let total_objects: i64 = buckets
        .iter()
        .flat_map(|tasks| tasks.iter().map(|t| t.object_count))
        .sum();
    if total_objects <= 0 {
        return Err(CoreError::EmptyWorkingSet);
    }

    Ok(BUCKET_ORDER
        .map(|bucket| {
            let tasks = &buckets[bucket.index()];
            SplitCount {
                bucket,
                image_count: tasks.iter().map(|t| t.frame_count).sum(),
                object_count: tasks.iter().map(|t| t.object_count).sum(),
                percentage: pct.by_index(bucket.index()).round() as i64,
            }
        })
        .to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: DbId, objects: i64) -> TaskWeight {
        TaskWeight {
            id,
            object_count: objects,
            frame_count: objects * 2,
        }
    }

    fn pct(training: f64, validation: f64, testing: f64) -> SplitPercentages {
        SplitPercentages {
            training,
            validation,
            testing,
        }
    }

    // -- validation --

    #[test]
    fn rejects_negative_percentage() {
        let tasks = vec![task(1, 10)];
        let err = allocate(&tasks, &pct(-10.0, 60.0, 50.0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPercentages(_)));
    }

    #[test]
    fn rejects_sum_not_100() {
        let tasks = vec![task(1, 10)];
        let err = allocate(&tasks, &pct(50.0, 30.0, 30.0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPercentages(_)));
    }

    #[test]
    fn accepts_fractional_triple_summing_to_100() {
        let tasks = vec![task(1, 10)];
        assert!(allocate(&tasks, &pct(70.5, 19.5, 10.0)).is_ok());
    }

    #[test]
    fn zero_total_objects_is_empty_working_set() {
        // Scenario C: tasks exist but carry no objects.
        let tasks = vec![task(1, 0), task(2, 0)];
        let err = allocate(&tasks, &pct(70.0, 20.0, 10.0)).unwrap_err();
        assert!(matches!(err, CoreError::EmptyWorkingSet));
    }

    #[test]
    fn empty_pool_is_empty_working_set() {
        let err = allocate(&[], &pct(70.0, 20.0, 10.0)).unwrap_err();
        assert!(matches!(err, CoreError::EmptyWorkingSet));
    }

    // -- Scenario A: exact fill --

    #[test]
    fn exact_fill_ten_even_tasks() {
        let tasks: Vec<TaskWeight> = (1..=10).map(|id| task(id, 10)).collect();
        let outcome = allocate(&tasks, &pct(70.0, 20.0, 10.0)).unwrap();

        let [training, validation, testing] = &outcome.buckets;
        assert_eq!(training.task_ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(training.object_count, 70);
        assert_eq!(training.percentage, 70);

        assert_eq!(validation.task_ids, vec![8, 9]);
        assert_eq!(validation.object_count, 20);
        assert_eq!(validation.percentage, 20);

        assert_eq!(testing.task_ids, vec![10]);
        assert_eq!(testing.object_count, 10);
        assert_eq!(testing.percentage, 10);
    }

    // -- Scenario B: overshoot admitted on smaller error --

    #[test]
    fn overshoot_admitted_when_closer_than_undershoot() {
        let tasks = vec![task(1, 60), task(2, 60)];
        let outcome = allocate(&tasks, &pct(50.0, 30.0, 20.0)).unwrap();

        let [training, validation, testing] = &outcome.buckets;
        // Target 60: task 1 lands exactly.
        assert_eq!(training.task_ids, vec![1]);
        assert_eq!(training.object_count, 60);
        // Target 36: admitting task 2 overshoots by 24, which beats the
        // undershoot of 36.
        assert_eq!(validation.task_ids, vec![2]);
        assert_eq!(validation.object_count, 60);
        assert_eq!(validation.percentage, 50);
        // Testing gets nothing.
        assert!(testing.task_ids.is_empty());
        assert_eq!(testing.object_count, 0);
        assert_eq!(testing.percentage, 0);
    }

    #[test]
    fn overshoot_rejected_when_undershoot_is_smaller() {
        // Target 10 for training; the 80-object task overshoots by 70,
        // worse than the undershoot of 10, so it falls through.
        let tasks = vec![task(1, 80), task(2, 20)];
        let outcome = allocate(&tasks, &pct(10.0, 70.0, 20.0)).unwrap();

        let [training, validation, _] = &outcome.buckets;
        assert!(training.task_ids.is_empty());
        assert_eq!(validation.task_ids, vec![1]);
    }

    // -- last bucket absorbs --

    #[test]
    fn testing_bucket_absorbs_all_leftovers() {
        // Targets {6, 6, 100}: the final task pushes testing past its
        // target, but the last bucket must keep admitting.
        let tasks = vec![task(1, 5), task(2, 5), task(3, 60), task(4, 40), task(5, 1)];
        let outcome = allocate(&tasks, &pct(5.0, 5.0, 90.0)).unwrap();

        let assigned: usize = outcome.buckets.iter().map(|b| b.task_ids.len()).sum();
        assert_eq!(assigned, tasks.len(), "every task must land in a bucket");
        assert_eq!(outcome.buckets[2].task_ids, vec![3, 4, 5]);
    }

    #[test]
    fn zero_target_bucket_stays_empty() {
        let tasks = vec![task(1, 10), task(2, 10)];
        let outcome = allocate(&tasks, &pct(0.0, 50.0, 50.0)).unwrap();
        assert!(outcome.buckets[0].task_ids.is_empty());
        assert_eq!(outcome.buckets[1].task_ids, vec![1]);
        assert_eq!(outcome.buckets[2].task_ids, vec![2]);
    }

    // -- conservation --

    #[test]
    fn conserves_objects_and_tasks() {
        let tasks = vec![
            task(1, 13),
            task(2, 7),
            task(3, 29),
            task(4, 3),
            task(5, 17),
            task(6, 11),
            task(7, 23),
        ];
        let total: i64 = tasks.iter().map(|t| t.object_count).sum();
        let outcome = allocate(&tasks, &pct(60.0, 30.0, 10.0)).unwrap();

        let bucket_total: i64 = outcome.buckets.iter().map(|b| b.object_count).sum();
        assert_eq!(bucket_total, total);

        let mut seen: Vec<DbId> = outcome.all_task_ids();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7], "each task in exactly one bucket");
    }

    #[test]
    fn frame_counts_accumulate_per_bucket() {
        let tasks: Vec<TaskWeight> = (1..=10).map(|id| task(id, 10)).collect();
        let outcome = allocate(&tasks, &pct(70.0, 20.0, 10.0)).unwrap();
        // task() gives each task frame_count = 2 * object_count.
        assert_eq!(outcome.buckets[0].image_count, 140);
        assert_eq!(outcome.buckets[1].image_count, 40);
        assert_eq!(outcome.buckets[2].image_count, 20);
    }

    // -- determinism & order sensitivity --

    #[test]
    fn identical_input_gives_identical_output() {
        let tasks = vec![task(1, 9), task(2, 4), task(3, 31), task(4, 6)];
        let a = allocate(&tasks, &pct(50.0, 25.0, 25.0)).unwrap();
        let b = allocate(&tasks, &pct(50.0, 25.0, 25.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn assignment_depends_on_input_order() {
        let forward = vec![task(1, 60), task(2, 30), task(3, 10)];
        let reversed = vec![task(3, 10), task(2, 30), task(1, 60)];
        let a = allocate(&forward, &pct(60.0, 30.0, 10.0)).unwrap();
        let b = allocate(&reversed, &pct(60.0, 30.0, 10.0)).unwrap();
        assert_ne!(
            a.buckets[0].task_ids, b.buckets[0].task_ids,
            "the pass is order-sensitive by contract"
        );
    }

    // -- manual splits --

    #[test]
    fn manual_counts_report_requested_percentages() {
        let buckets = [
            vec![task(1, 50), task(2, 30)],
            vec![task(3, 15)],
            vec![task(4, 5)],
        ];
        let counts = manual_split_counts(&buckets, &pct(80.0, 15.0, 5.0)).unwrap();
        assert_eq!(counts[0].object_count, 80);
        assert_eq!(counts[0].image_count, 160);
        assert_eq!(counts[0].percentage, 80);
        assert_eq!(counts[1].object_count, 15);
        assert_eq!(counts[2].object_count, 5);
    }

    #[test]
    fn manual_counts_reject_empty_pool() {
        let buckets: [Vec<TaskWeight>; 3] = [vec![], vec![], vec![]];
        let err = manual_split_counts(&buckets, &pct(70.0, 20.0, 10.0)).unwrap_err();
        assert!(matches!(err, CoreError::EmptyWorkingSet));
    }
}
