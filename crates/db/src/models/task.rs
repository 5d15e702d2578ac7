//! Task models for completed annotation work items.
//!
//! A task is immutable for the engine's purposes except for its
//! membership tags, which live in `task_memberships`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use annolab_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A task row from the `tasks` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    /// Source-video grouping key shared by all tasks cut from the same
    /// upload.
    pub video_key: String,
    pub frame_count: i64,
    pub object_count: i64,
    /// Per-label/per-attribute object tallies (array of
    /// `annolab_core::stats::LabelTally`).
    pub label_counts: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a new task.
#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub video_key: String,
    pub frame_count: i64,
    pub object_count: i64,
    pub label_counts: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Query projections
// ---------------------------------------------------------------------------

/// The per-task counts the split allocator works with.
#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct TaskCounts {
    pub id: DbId,
    pub object_count: i64,
    pub frame_count: i64,
}

/// Summed counts over a set of tasks.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CountTotals {
    pub frame_count: i64,
    pub object_count: i64,
}
