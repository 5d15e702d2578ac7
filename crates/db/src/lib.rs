//! Persistence layer for the Annolab dataset split & versioning engine.
//!
//! Models are `FromRow` structs matching their table; repositories are
//! zero-sized structs providing async methods that accept `&PgPool` as
//! the first argument.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Shared connection pool alias used across the workspace.
pub type DbPool = PgPool;

/// Connect a pool against `database_url`.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}
