//! Repository for the `dataset_groups` table.

use sqlx::PgPool;

use annolab_core::types::DbId;

use crate::models::dataset_group::{CreateDatasetGroup, DatasetGroup};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, project_ids, version_ids, created_at, updated_at";

/// Provides CRUD and version-linking operations for dataset groups.
pub struct DatasetGroupRepo;

impl DatasetGroupRepo {
    /// Insert a new group, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDatasetGroup,
    ) -> Result<DatasetGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO dataset_groups (name, project_ids) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetGroup>(&query)
            .bind(&input.name)
            .bind(&input.project_ids)
            .fetch_one(pool)
            .await
    }

    /// Find a group by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DatasetGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dataset_groups WHERE id = $1");
        sqlx::query_as::<_, DatasetGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append a version to the end of the group's ordered version list.
    pub async fn append_version(
        pool: &PgPool,
        group_id: DbId,
        version_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dataset_groups \
             SET version_ids = ARRAY_APPEND(version_ids, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(group_id)
        .bind(version_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a version from the group's version list.
    pub async fn remove_version(
        pool: &PgPool,
        group_id: DbId,
        version_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dataset_groups \
             SET version_ids = ARRAY_REMOVE(version_ids, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(group_id)
        .bind(version_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count the versions currently belonging to a group.
    pub async fn count_versions(pool: &PgPool, group_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dataset_versions WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(pool)
            .await
    }

    /// Permanently delete a group. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dataset_groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
