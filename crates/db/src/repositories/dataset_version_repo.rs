//! Repository for the `dataset_versions` table.

use sqlx::PgPool;

use annolab_core::types::DbId;

use crate::models::dataset_version::{
    CreateDatasetVersion, DatasetVersion, UpdateSplit, UpdateStats,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, group_id, version_no, creation_mode, version_type, split_counts, \
    task_ids, split_tasks, pending, task_status, labels, augmentations, label_stats, \
    total_frames, total_objects, stats_refreshed_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for dataset versions.
pub struct DatasetVersionRepo;

impl DatasetVersionRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new version row. New versions always start pending.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDatasetVersion,
    ) -> Result<DatasetVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO dataset_versions
                (group_id, version_no, creation_mode, version_type, split_counts,
                 task_ids, split_tasks, labels, augmentations, pending)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(input.group_id)
            .bind(&input.version_no)
            .bind(input.creation_mode)
            .bind(input.version_type)
            .bind(&input.split_counts)
            .bind(&input.task_ids)
            .bind(&input.split_tasks)
            .bind(&input.labels)
            .bind(&input.augmentations)
            .fetch_one(pool)
            .await
    }

    /// Find a version by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DatasetVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dataset_versions WHERE id = $1");
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all versions of a group, oldest first.
    pub async fn list_by_group(
        pool: &PgPool,
        group_id: DbId,
    ) -> Result<Vec<DatasetVersion>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM dataset_versions WHERE group_id = $1 ORDER BY id");
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(group_id)
            .fetch_all(pool)
            .await
    }

    /// Permanently delete a version row. Returns `true` if a row was
    /// removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dataset_versions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Lifecycle operations ─────────────────────────────────────────

    /// All version number strings within a group, for computing the
    /// next number.
    pub async fn list_version_numbers(
        pool: &PgPool,
        group_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT version_no FROM dataset_versions WHERE group_id = $1")
                .bind(group_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Replace the split assignment in place (re-balance or membership
    /// edit). Marks the version pending and clears the export-progress
    /// scratch.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_split(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSplit,
    ) -> Result<Option<DatasetVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE dataset_versions SET
                split_counts = $2,
                task_ids = $3,
                split_tasks = $4,
                version_type = $5,
                pending = TRUE,
                task_status = NULL,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(id)
            .bind(&input.split_counts)
            .bind(&input.task_ids)
            .bind(&input.split_tasks)
            .bind(input.version_type)
            .fetch_optional(pool)
            .await
    }

    /// Replace the label set in place. Marks the version pending,
    /// stamps it as a label version, and clears the export-progress
    /// scratch.
    pub async fn update_labels(
        pool: &PgPool,
        id: DbId,
        labels: &serde_json::Value,
        version_type: i16,
    ) -> Result<Option<DatasetVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE dataset_versions SET
                labels = $2,
                version_type = $3,
                pending = TRUE,
                task_status = NULL,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(id)
            .bind(labels)
            .bind(version_type)
            .fetch_optional(pool)
            .await
    }

    /// Replace the augmentation settings in place. Marks the version
    /// pending, stamps it as an augmentation version, and clears the
    /// export-progress scratch.
    pub async fn update_augmentations(
        pool: &PgPool,
        id: DbId,
        augmentations: &serde_json::Value,
        version_type: i16,
    ) -> Result<Option<DatasetVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE dataset_versions SET
                augmentations = $2,
                version_type = $3,
                pending = TRUE,
                task_status = NULL,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetVersion>(&query)
            .bind(id)
            .bind(augmentations)
            .bind(version_type)
            .fetch_optional(pool)
            .await
    }

    /// Write freshly recomputed aggregates and clear the pending flag.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_stats(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStats,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dataset_versions SET
                label_stats = $2,
                total_frames = $3,
                total_objects = $4,
                pending = FALSE,
                stats_refreshed_at = NOW(),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.label_stats)
        .bind(input.total_frames)
        .bind(input.total_objects)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of all versions still waiting for a successful stats
    /// recompute, oldest first.
    pub async fn list_pending_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM dataset_versions WHERE pending ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
