//! Postgres storage for Folio.
//!
//! - [`models`]: `FromRow` row structs and insert DTOs.
//! - [`repositories`]: zero-sized repositories with async query methods.
//! - [`bind`]: binds [`folio_core::query::QueryPart`] arguments onto sqlx queries.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod bind;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the pool can reach Postgres.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
