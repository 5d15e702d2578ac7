//! Chunked membership tag propagation.
//!
//! Every membership change fans out to the task store and the frame
//! store (frames matched by owning task id). Id lists are sliced into
//! chunks of [`MEMBERSHIP_CHUNK_LIMIT`] and written one chunk at a
//! time, so a version touching a million tasks never produces a single
//! oversized statement.
//!
//! Chunks are independent: there is no cross-chunk ordering and no
//! overall transaction. A failed chunk is retried once; if it still
//! fails, the remaining chunks are processed anyway and the call
//! reports [`EngineError::PartialPropagation`]. Because attach
//! de-duplicates on `(entity, version_id)` and retag/detach match on
//! it, re-issuing the entire call is always safe.

use annolab_core::bucket::BucketType;
use annolab_core::chunk::{chunk_count, MEMBERSHIP_CHUNK_LIMIT};
use annolab_core::types::DbId;
use annolab_db::repositories::{FrameMembershipRepo, TaskMembershipRepo};
use annolab_db::DbPool;

use crate::error::EngineError;

/// Attempts per chunk before it counts as failed.
const CHUNK_ATTEMPTS: u32 = 2;

/// The three membership mutations.
#[derive(Debug, Clone, Copy)]
enum TagOp {
    Attach(BucketType),
    Retag(BucketType),
    Detach,
}

impl TagOp {
    fn name(self) -> &'static str {
        match self {
            Self::Attach(_) => "attach",
            Self::Retag(_) => "retag",
            Self::Detach => "detach",
        }
    }
}

/// Applies membership tags to tasks and frames in size-bounded chunks.
pub struct TagPropagator;

impl TagPropagator {
    /// Tag each task (and all of its frames) as a member of
    /// `version_id` in `bucket`.
    pub async fn attach(
        pool: &DbPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<(), EngineError> {
        Self::fan_out(pool, task_ids, version_id, TagOp::Attach(bucket)).await
    }

    /// Move the existing `version_id` tag of each task (and its
    /// frames) to `bucket`.
    pub async fn retag(
        pool: &DbPool,
        task_ids: &[DbId],
        version_id: DbId,
        bucket: BucketType,
    ) -> Result<(), EngineError> {
        Self::fan_out(pool, task_ids, version_id, TagOp::Retag(bucket)).await
    }

    /// Remove the `version_id` tag from each task and its frames.
    pub async fn detach(
        pool: &DbPool,
        task_ids: &[DbId],
        version_id: DbId,
    ) -> Result<(), EngineError> {
        Self::fan_out(pool, task_ids, version_id, TagOp::Detach).await
    }

    async fn fan_out(
        pool: &DbPool,
        task_ids: &[DbId],
        version_id: DbId,
        op: TagOp,
    ) -> Result<(), EngineError> {
        let total = chunk_count(task_ids.len(), MEMBERSHIP_CHUNK_LIMIT);
        let mut failed = 0usize;

        for chunk in task_ids.chunks(MEMBERSHIP_CHUNK_LIMIT) {
            let mut done = false;
            for attempt in 1..=CHUNK_ATTEMPTS {
                match Self::apply_chunk(pool, chunk, version_id, op).await {
                    Ok(()) => {
                        done = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            version_id,
                            op = op.name(),
                            chunk_len = chunk.len(),
                            attempt,
                            error = %e,
                            "Membership chunk write failed"
                        );
                    }
                }
            }
            if !done {
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(EngineError::PartialPropagation { failed, total });
        }

        tracing::debug!(
            version_id,
            op = op.name(),
            tasks = task_ids.len(),
            chunks = total,
            "Membership propagation complete"
        );
        Ok(())
    }

    /// One chunk against both stores.
    async fn apply_chunk(
        pool: &DbPool,
        chunk: &[DbId],
        version_id: DbId,
        op: TagOp,
    ) -> Result<(), sqlx::Error> {
        match op {
            TagOp::Attach(bucket) => {
                TaskMembershipRepo::attach(pool, chunk, version_id, bucket).await?;
                FrameMembershipRepo::attach(pool, chunk, version_id, bucket).await?;
            }
            TagOp::Retag(bucket) => {
                TaskMembershipRepo::retag(pool, chunk, version_id, bucket).await?;
                FrameMembershipRepo::retag(pool, chunk, version_id, bucket).await?;
            }
            TagOp::Detach => {
                TaskMembershipRepo::detach(pool, chunk, version_id).await?;
                FrameMembershipRepo::detach(pool, chunk, version_id).await?;
            }
        }
        Ok(())
    }
}
