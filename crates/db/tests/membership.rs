//! Integration tests for membership tag operations.
//!
//! Exercises `TaskMembershipRepo` and `FrameMembershipRepo` against a
//! real database:
//! - Attach de-duplicates on `(entity, version_id)`
//! - A task/frame carries at most one tag per version, any number of
//!   versions
//! - Retag moves the bucket in place, never duplicating
//! - Detach removes only the targeted version's tags
//! - Frame operations match frames by owning task id

use sqlx::PgPool;

use annolab_core::bucket::BucketType;
use annolab_db::models::frame::CreateFrame;
use annolab_db::models::task::{CreateTask, Task};
use annolab_db::repositories::{FrameMembershipRepo, FrameRepo, TaskMembershipRepo, TaskRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_task(pool: &PgPool, video_key: &str, frames: i64, objects: i64) -> Task {
    let task = TaskRepo::create(
        pool,
        &CreateTask {
            project_id: 1,
            video_key: video_key.to_string(),
            frame_count: frames,
            object_count: objects,
            label_counts: serde_json::json!([]),
        },
    )
    .await
    .unwrap();

    for frame_index in 0..frames as i32 {
        FrameRepo::create(
            pool,
            &CreateFrame {
                task_id: task.id,
                frame_index,
            },
        )
        .await
        .unwrap();
    }
    task
}

// ---------------------------------------------------------------------------
// Test: attach is de-duplicated by (entity, version)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_deduplicates_per_version(pool: PgPool) {
    let a = new_task(&pool, "clip_a", 3, 10).await;
    let b = new_task(&pool, "clip_b", 2, 10).await;
    let version_id = 101;

    let inserted =
        TaskMembershipRepo::attach(&pool, &[a.id, b.id], version_id, BucketType::Training)
            .await
            .unwrap();
    assert_eq!(inserted, 2);
    FrameMembershipRepo::attach(&pool, &[a.id, b.id], version_id, BucketType::Training)
        .await
        .unwrap();

    // Re-issuing the identical attach must not create duplicates.
    let reinserted =
        TaskMembershipRepo::attach(&pool, &[a.id, b.id], version_id, BucketType::Training)
            .await
            .unwrap();
    assert_eq!(reinserted, 0, "second attach inserts nothing");
    let frame_reinserted =
        FrameMembershipRepo::attach(&pool, &[a.id, b.id], version_id, BucketType::Training)
            .await
            .unwrap();
    assert_eq!(frame_reinserted, 0);

    let task_tags = TaskMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(task_tags.len(), 2);

    let frame_tags = FrameMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(frame_tags.len(), 5, "3 frames of a + 2 frames of b");
}

// ---------------------------------------------------------------------------
// Test: one tag per version, many versions per task
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_carries_one_tag_per_version(pool: PgPool) {
    let task = new_task(&pool, "clip", 1, 5).await;

    TaskMembershipRepo::attach(&pool, &[task.id], 201, BucketType::Training)
        .await
        .unwrap();
    TaskMembershipRepo::attach(&pool, &[task.id], 202, BucketType::Testing)
        .await
        .unwrap();
    // A conflicting attach for an already-tagged version is ignored.
    TaskMembershipRepo::attach(&pool, &[task.id], 201, BucketType::Validation)
        .await
        .unwrap();

    let tags = TaskMembershipRepo::list_by_task(&pool, task.id).await.unwrap();
    assert_eq!(tags.len(), 2, "one tag per version");
    assert_eq!(tags[0].version_id, 201);
    assert_eq!(
        tags[0].bucket,
        BucketType::Training.as_i16(),
        "the original bucket survives a conflicting attach"
    );
    assert_eq!(tags[1].version_id, 202);
}

// ---------------------------------------------------------------------------
// Test: retag moves the bucket in place
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retag_moves_bucket_without_duplicates(pool: PgPool) {
    let task = new_task(&pool, "clip", 2, 5).await;
    let version_id = 301;

    TaskMembershipRepo::attach(&pool, &[task.id], version_id, BucketType::Training)
        .await
        .unwrap();
    FrameMembershipRepo::attach(&pool, &[task.id], version_id, BucketType::Training)
        .await
        .unwrap();

    let retagged =
        TaskMembershipRepo::retag(&pool, &[task.id], version_id, BucketType::Validation)
            .await
            .unwrap();
    assert_eq!(retagged, 1);
    FrameMembershipRepo::retag(&pool, &[task.id], version_id, BucketType::Validation)
        .await
        .unwrap();

    let task_tags = TaskMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(task_tags.len(), 1, "retag never adds rows");
    assert_eq!(task_tags[0].bucket, BucketType::Validation.as_i16());

    let frame_tags = FrameMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(frame_tags.len(), 2);
    assert!(frame_tags
        .iter()
        .all(|t| t.bucket == BucketType::Validation.as_i16()));

    // Retag is idempotent.
    TaskMembershipRepo::retag(&pool, &[task.id], version_id, BucketType::Validation)
        .await
        .unwrap();
    let task_tags = TaskMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(task_tags.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: retag without an existing tag creates nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retag_untagged_task_is_noop(pool: PgPool) {
    let task = new_task(&pool, "clip", 1, 5).await;

    let retagged = TaskMembershipRepo::retag(&pool, &[task.id], 401, BucketType::Testing)
        .await
        .unwrap();
    assert_eq!(retagged, 0);
    assert!(TaskMembershipRepo::list_by_version(&pool, 401)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: detach removes only the targeted version
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_detach_removes_only_this_version(pool: PgPool) {
    let task = new_task(&pool, "clip", 2, 5).await;

    for version_id in [501, 502] {
        TaskMembershipRepo::attach(&pool, &[task.id], version_id, BucketType::Training)
            .await
            .unwrap();
        FrameMembershipRepo::attach(&pool, &[task.id], version_id, BucketType::Training)
            .await
            .unwrap();
    }

    let detached = TaskMembershipRepo::detach(&pool, &[task.id], 501).await.unwrap();
    assert_eq!(detached, 1);
    FrameMembershipRepo::detach(&pool, &[task.id], 501).await.unwrap();

    let tags = TaskMembershipRepo::list_by_task(&pool, task.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].version_id, 502);

    assert!(FrameMembershipRepo::list_by_version(&pool, 501)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        FrameMembershipRepo::list_by_version(&pool, 502)
            .await
            .unwrap()
            .len(),
        2
    );

    // Detach is idempotent.
    let detached_again = TaskMembershipRepo::detach(&pool, &[task.id], 501).await.unwrap();
    assert_eq!(detached_again, 0);
}

// ---------------------------------------------------------------------------
// Test: frame operations match by owning task id
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_frame_tags_follow_owning_task(pool: PgPool) {
    let tagged = new_task(&pool, "clip_a", 3, 5).await;
    let untouched = new_task(&pool, "clip_b", 4, 5).await;
    let version_id = 601;

    FrameMembershipRepo::attach(&pool, &[tagged.id], version_id, BucketType::Testing)
        .await
        .unwrap();

    let frame_tags = FrameMembershipRepo::list_by_version(&pool, version_id)
        .await
        .unwrap();
    assert_eq!(frame_tags.len(), 3, "only frames of the tagged task");
    assert!(frame_tags.iter().all(|t| t.task_id == tagged.id));
    assert!(frame_tags.iter().all(|t| t.task_id != untouched.id));
}
