use annolab_core::types::DbId;
use annolab_core::CoreError;

/// Failures surfaced by the versioning engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Dataset version not found: {0}")]
    VersionNotFound(DbId),

    #[error("Dataset group not found: {0}")]
    GroupNotFound(DbId),

    /// One or more membership chunks failed after retries. The call is
    /// safe to re-issue as a whole: every membership operation is
    /// idempotent per id.
    #[error("Membership propagation incomplete: {failed} of {total} chunks failed")]
    PartialPropagation { failed: usize, total: usize },

    #[error("Malformed stored document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}
