//! Repository for the `tasks` table.

use sqlx::PgPool;

use annolab_core::types::DbId;

use crate::models::task::{CountTotals, CreateTask, Task, TaskCounts};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, project_id, video_key, frame_count, object_count, label_counts, created_at, updated_at";

/// Provides CRUD and count-aggregation operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, video_key, frame_count, object_count, label_counts)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.project_id)
            .bind(&input.video_key)
            .bind(input.frame_count)
            .bind(input.object_count)
            .bind(&input.label_counts)
            .fetch_one(pool)
            .await
    }

    /// Find a task by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch allocator counts for an explicit id set, ordered by task id
    /// for a reproducible assignment order.
    pub async fn list_counts(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<TaskCounts>, sqlx::Error> {
        sqlx::query_as::<_, TaskCounts>(
            "SELECT id, object_count, frame_count FROM tasks \
             WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Fetch allocator counts for the current members of a version,
    /// ordered by task id for a reproducible assignment order.
    pub async fn list_counts_for_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Vec<TaskCounts>, sqlx::Error> {
        sqlx::query_as::<_, TaskCounts>(
            "SELECT t.id, t.object_count, t.frame_count \
             FROM tasks t \
             JOIN task_memberships m ON m.task_id = t.id \
             WHERE m.version_id = $1 \
             ORDER BY t.id",
        )
        .bind(version_id)
        .fetch_all(pool)
        .await
    }

    /// Summed frame and object counts over an explicit id set.
    pub async fn sum_counts(pool: &PgPool, ids: &[DbId]) -> Result<CountTotals, sqlx::Error> {
        sqlx::query_as::<_, CountTotals>(
            "SELECT COALESCE(SUM(frame_count), 0)::BIGINT AS frame_count, \
                    COALESCE(SUM(object_count), 0)::BIGINT AS object_count \
             FROM tasks WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_one(pool)
        .await
    }

    /// Summed frame and object counts over a version's current members.
    pub async fn sum_counts_for_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<CountTotals, sqlx::Error> {
        sqlx::query_as::<_, CountTotals>(
            "SELECT COALESCE(SUM(t.frame_count), 0)::BIGINT AS frame_count, \
                    COALESCE(SUM(t.object_count), 0)::BIGINT AS object_count \
             FROM tasks t \
             JOIN task_memberships m ON m.task_id = t.id \
             WHERE m.version_id = $1",
        )
        .bind(version_id)
        .fetch_one(pool)
        .await
    }

    /// The raw label tallies of a version's current members, used by
    /// stats recomputation.
    pub async fn label_tallies_for_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Vec<serde_json::Value>, sqlx::Error> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT t.label_counts \
             FROM tasks t \
             JOIN task_memberships m ON m.task_id = t.id \
             WHERE m.version_id = $1",
        )
        .bind(version_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
