//! Dataset version models.
//!
//! A version is a snapshot of one group's split assignment, label set,
//! and augmentation settings. It is created pending; the stats
//! recalculator clears the flag once aggregates are fresh, and every
//! subsequent edit sets it again.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use annolab_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A version row from the `dataset_versions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DatasetVersion {
    pub id: DbId,
    pub group_id: DbId,
    /// `major.minor.patch`, e.g. `"1.0.1"`.
    pub version_no: String,
    /// Wire value of `annolab_core::CreationMode`.
    pub creation_mode: i16,
    /// Wire value of `annolab_core::VersionType`.
    pub version_type: i16,
    /// Fixed 3-element array of `annolab_core::SplitCount`.
    pub split_counts: serde_json::Value,
    /// Full membership in assignment order.
    pub task_ids: Vec<DbId>,
    /// Per-bucket sub-lists (array of `annolab_core::BucketTasks`).
    pub split_tasks: serde_json::Value,
    pub pending: bool,
    /// Export-progress scratch; cleared whenever the version is edited.
    pub task_status: Option<serde_json::Value>,
    pub labels: Option<serde_json::Value>,
    pub augmentations: Option<serde_json::Value>,
    /// Array of `annolab_core::stats::LabelStat`, refreshed by the
    /// stats recalculator.
    pub label_stats: serde_json::Value,
    pub total_frames: i64,
    pub total_objects: i64,
    pub stats_refreshed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for persisting a new version row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDatasetVersion {
    pub group_id: DbId,
    pub version_no: String,
    pub creation_mode: i16,
    pub version_type: i16,
    pub split_counts: serde_json::Value,
    pub task_ids: Vec<DbId>,
    pub split_tasks: serde_json::Value,
    pub labels: Option<serde_json::Value>,
    pub augmentations: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Update DTOs
// ---------------------------------------------------------------------------

/// Replacement split assignment for an in-place edit.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSplit {
    pub split_counts: serde_json::Value,
    pub task_ids: Vec<DbId>,
    pub split_tasks: serde_json::Value,
    pub version_type: i16,
}

/// Freshly recomputed aggregates written back by the stats
/// recalculator.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStats {
    pub label_stats: serde_json::Value,
    pub total_frames: i64,
    pub total_objects: i64,
}
