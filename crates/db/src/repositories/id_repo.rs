//! Allocation of new base-31 ids for pages and users.

use folio_core::ids::{increment_base31_id, IdError, EMPTY_ID_SEED};
use sqlx::PgConnection;

/// Advisory lock key serializing id allocation across connections.
const ID_ALLOCATION_LOCK: i64 = 0x666f_6c69_6f69;

#[derive(Debug, thiserror::Error)]
pub enum IdAllocError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Stored id is not base-31: {0}")]
    Id(#[from] IdError),
}

pub struct IdRepo;

impl IdRepo {
    /// Highest id in use across pages and users, incremented by one.
    ///
    /// Must run inside the transaction that inserts the new row: the
    /// advisory lock is released on commit, so two concurrent callers can
    /// never observe the same maximum.
    pub async fn next_available_id(conn: &mut PgConnection) -> Result<String, IdAllocError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ID_ALLOCATION_LOCK)
            .execute(&mut *conn)
            .await?;

        let max_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM ( \
                 SELECT page_id AS id FROM page_infos \
                 UNION ALL \
                 SELECT id FROM users \
             ) AS ids \
             ORDER BY char_length(id) DESC, id COLLATE \"C\" DESC \
             LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await?;

        let previous = max_id.unwrap_or_else(|| EMPTY_ID_SEED.to_string());
        Ok(increment_base31_id(&previous)?)
    }
}
