//! Repository for the `task_memberships` table.
//!
//! All three mutations operate on an id list and are idempotent per id:
//! attach de-duplicates on the `(task_id, version_id)` primary key,
//! retag and detach match on it. Callers keep individual id lists
//! within the membership chunk limit; nothing here re-chunks.

use sqlx::PgPool;

use annolab_core::bucket::BucketType;
use annolab_core::types::DbId;

use crate::models::membership::TaskMembership;

/// Provides membership tag operations on tasks.
pub struct TaskMembershipRepo;

impl TaskMembershipRepo {
    /// Attach a `(version, bucket)` tag to each task. Tasks already
    /// tagged for this version are left untouched.
    ///
    /// Returns the number of rows actually inserted.
    pub async fn attach(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO task_memberships (task_id, version_id, bucket) \
             SELECT UNNEST($1::BIGINT[]), $2, $3 \
             ON CONFLICT (task_id, version_id) DO NOTHING",
        )
        .bind(task_ids)
        .bind(version_id)
        .bind(bucket.as_i16())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move each task's existing tag for this version to a new bucket.
    ///
    /// Tasks without a tag for this version are left untouched (no tag
    /// is created). Returns the number of rows updated.
    pub async fn retag(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE task_memberships SET bucket = $3 \
             WHERE version_id = $2 AND task_id = ANY($1)",
        )
        .bind(task_ids)
        .bind(version_id)
        .bind(bucket.as_i16())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove each task's tag for this version, if present.
    ///
    /// Returns the number of rows deleted.
    pub async fn detach(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM task_memberships WHERE version_id = $2 AND task_id = ANY($1)",
        )
        .bind(task_ids)
        .bind(version_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// All membership rows of a version, ordered by task id.
    pub async fn list_by_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Vec<TaskMembership>, sqlx::Error> {
        sqlx::query_as::<_, TaskMembership>(
            "SELECT task_id, version_id, bucket, created_at \
             FROM task_memberships WHERE version_id = $1 ORDER BY task_id",
        )
        .bind(version_id)
        .fetch_all(pool)
        .await
    }

    /// All membership rows of a single task, ordered by version id.
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Vec<TaskMembership>, sqlx::Error> {
        sqlx::query_as::<_, TaskMembership>(
            "SELECT task_id, version_id, bucket, created_at \
             FROM task_memberships WHERE task_id = $1 ORDER BY version_id",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
