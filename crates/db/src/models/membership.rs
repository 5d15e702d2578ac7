//! Membership tag rows.
//!
//! A membership tag is a `(version_id, bucket)` pair attached to a task
//! or frame. The primary keys `(task_id, version_id)` /
//! `(frame_id, version_id)` guarantee at most one tag per version per
//! entity; frames carry their own denormalized copy and are always
//! addressed through their owning task id.

use serde::Serialize;
use sqlx::FromRow;

use annolab_core::types::{DbId, Timestamp};

/// A row from the `task_memberships` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskMembership {
    pub task_id: DbId,
    pub version_id: DbId,
    /// Wire value of `annolab_core::BucketType`.
    pub bucket: i16,
    pub created_at: Timestamp,
}

/// A row from the `frame_memberships` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FrameMembership {
    pub frame_id: DbId,
    pub task_id: DbId,
    pub version_id: DbId,
    /// Wire value of `annolab_core::BucketType`.
    pub bucket: i16,
    pub created_at: Timestamp,
}
