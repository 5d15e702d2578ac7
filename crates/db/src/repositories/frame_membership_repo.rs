//! Repository for the `frame_memberships` table.
//!
//! Frames carry a denormalized copy of their task's membership tags and
//! are always addressed through the owning task id: every operation
//! here takes a *task* id list and touches all frames of those tasks.

use sqlx::PgPool;

use annolab_core::bucket::BucketType;
use annolab_core::types::DbId;

use crate::models::membership::FrameMembership;

/// Provides membership tag operations on frames, matched by owning
/// task id.
pub struct FrameMembershipRepo;

impl FrameMembershipRepo {
    /// Attach a `(version, bucket)` tag to every frame of the given
    /// tasks. Frames already tagged for this version are left
    /// untouched.
    ///
    /// Returns the number of rows actually inserted.
    pub async fn attach(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO frame_memberships (frame_id, task_id, version_id, bucket) \
             SELECT f.id, f.task_id, $2, $3 FROM frames f WHERE f.task_id = ANY($1) \
             ON CONFLICT (frame_id, version_id) DO NOTHING",
        )
        .bind(task_ids)
        .bind(version_id)
        .bind(bucket.as_i16())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move the tag of every frame of the given tasks to a new bucket.
    ///
    /// Returns the number of rows updated.
    pub async fn retag(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE frame_memberships SET bucket = $3 \
             WHERE version_id = $2 AND task_id = ANY($1)",
        )
        .bind(task_ids)
        .bind(version_id)
        .bind(bucket.as_i16())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove the tag of every frame of the given tasks for this
    /// version.
    ///
    /// Returns the number of rows deleted.
    pub async fn detach(
        pool: &PgPool,
        task_ids: &[DbId],
        version_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM frame_memberships WHERE version_id = $2 AND task_id = ANY($1)",
        )
        .bind(task_ids)
        .bind(version_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// All frame membership rows of a version, ordered by frame id.
    pub async fn list_by_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Vec<FrameMembership>, sqlx::Error> {
        sqlx::query_as::<_, FrameMembership>(
            "SELECT frame_id, task_id, version_id, bucket, created_at \
             FROM frame_memberships WHERE version_id = $1 ORDER BY frame_id",
        )
        .bind(version_id)
        .fetch_all(pool)
        .await
    }
}
