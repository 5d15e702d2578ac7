//! Repository for the `frames` table.

use sqlx::PgPool;

use annolab_core::types::DbId;

use crate::models::frame::{CreateFrame, Frame};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_id, frame_index, created_at";

/// Provides CRUD operations for frames.
pub struct FrameRepo;

impl FrameRepo {
    /// Insert a new frame, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateFrame) -> Result<Frame, sqlx::Error> {
        let query = format!(
            "INSERT INTO frames (task_id, frame_index) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Frame>(&query)
            .bind(input.task_id)
            .bind(input.frame_index)
            .fetch_one(pool)
            .await
    }

    /// List all frames of a task, ordered by frame index.
    pub async fn list_by_task(pool: &PgPool, task_id: DbId) -> Result<Vec<Frame>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM frames WHERE task_id = $1 ORDER BY frame_index");
        sqlx::query_as::<_, Frame>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Count the frames belonging to a set of tasks.
    pub async fn count_for_tasks(pool: &PgPool, task_ids: &[DbId]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM frames WHERE task_id = ANY($1)")
            .bind(task_ids)
            .fetch_one(pool)
            .await
    }
}
