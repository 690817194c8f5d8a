use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use folio_core::types::Timestamp;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub name: String,
    pub karma: i32,
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub email_frequency: String,
    #[serde(skip_serializing)]
    pub email_threshold: i32,
    #[serde(skip_serializing)]
    pub updates_last_emailed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a user. The id is allocated by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub karma: i32,
    pub is_admin: bool,
}
