use sqlx::FromRow;
use folio_core::types::{DbId, Timestamp};

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: DbId,
    pub tag: String,
    pub payload: serde_json::Value,
    pub unique_name: Option<String>,
    pub leased_until: Timestamp,
    pub attempts: i32,
    pub created_at: Timestamp,
}
