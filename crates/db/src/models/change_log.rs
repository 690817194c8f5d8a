use serde::Serialize;
use sqlx::FromRow;
use folio_core::pages::ChangeLogType;
use folio_core::types::{DbId, EditNum, Timestamp};

/// A row from the `change_logs` table. Rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog {
    pub id: DbId,
    pub page_id: String,
    pub edit: EditNum,
    pub user_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub log_type: String,
    pub aux_page_id: String,
    pub old_settings_value: String,
    pub new_settings_value: String,
    pub created_at: Timestamp,
}

/// DTO for appending a change log entry.
#[derive(Debug, Clone)]
pub struct CreateChangeLog<'a> {
    pub page_id: &'a str,
    pub edit: EditNum,
    pub user_id: &'a str,
    pub log_type: ChangeLogType,
    pub aux_page_id: &'a str,
}
