//! Dataset group models.
//!
//! A group is a named collection spanning one or more source projects;
//! it owns the ordered list of its version ids. A group with no
//! versions left does not exist — deleting the last version deletes the
//! group.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use annolab_core::types::{DbId, Timestamp};

/// A group row from the `dataset_groups` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DatasetGroup {
    pub id: DbId,
    pub name: String,
    pub project_ids: Vec<DbId>,
    /// Version ids in creation order, oldest first.
    pub version_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a new group.
#[derive(Debug, Deserialize)]
pub struct CreateDatasetGroup {
    pub name: String,
    pub project_ids: Vec<DbId>,
}
