//! Bucket types for dataset split assignments.
//!
//! A dataset version partitions its member tasks into exactly three
//! buckets — training, validation, testing — in that fixed order.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Number of buckets in every split. The order is fixed: training,
/// validation, testing.
pub const BUCKET_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// BucketType
// ---------------------------------------------------------------------------

/// The bucket a task/frame belongs to within one dataset version.
///
/// Wire values (1/2/3) match the stored SMALLINT representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketType {
    Training,
    Validation,
    Testing,
}

/// All buckets in assignment order.
pub const BUCKET_ORDER: [BucketType; BUCKET_COUNT] = [
    BucketType::Training,
    BucketType::Validation,
    BucketType::Testing,
];

impl BucketType {
    /// Stored SMALLINT value (1 = training, 2 = validation, 3 = testing).
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Training => 1,
            Self::Validation => 2,
            Self::Testing => 3,
        }
    }

    /// Parse the stored SMALLINT value.
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Training),
            2 => Some(Self::Validation),
            3 => Some(Self::Testing),
            _ => None,
        }
    }

    /// Position within [`BUCKET_ORDER`].
    pub fn index(self) -> usize {
        match self {
            Self::Training => 0,
            Self::Validation => 1,
            Self::Testing => 2,
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Training => "Training Set",
            Self::Validation => "Validation Set",
            Self::Testing => "Testing Set",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-bucket result types
// ---------------------------------------------------------------------------

/// Aggregate counts for one bucket of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCount {
    pub bucket: BucketType,
    /// Summed frame count of the bucket's tasks.
    pub image_count: i64,
    /// Summed object count of the bucket's tasks.
    pub object_count: i64,
    /// Share of the total object count, rounded to a whole percent.
    pub percentage: i64,
}

/// The task ids assigned to one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTasks {
    pub bucket: BucketType,
    pub task_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
