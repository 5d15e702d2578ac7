//! Frame models. A frame is a single annotated unit belonging to a task.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use annolab_core::types::{DbId, Timestamp};

/// A frame row from the `frames` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Frame {
    pub id: DbId,
    pub task_id: DbId,
    pub frame_index: i32,
    pub created_at: Timestamp,
}

/// Input for creating a new frame.
#[derive(Debug, Deserialize)]
pub struct CreateFrame {
    pub task_id: DbId,
    pub frame_index: i32,
}
