use crate::types::DbId;

/// Domain-level failures for the split & versioning engine.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid split percentages: {0}")]
    InvalidPercentages(String),

    #[error("No annotated objects in the selected tasks")]
    EmptyWorkingSet,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
