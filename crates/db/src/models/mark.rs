use serde::Serialize;
use sqlx::FromRow;
use folio_core::types::{DbId, EditNum, Timestamp};

/// A row from the `marks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: DbId,
    pub page_id: String,
    pub edit: EditNum,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub mark_type: String,
    #[serde(skip_serializing)]
    pub creator_id: String,
    pub text: String,
    pub anchor_context: String,
    pub anchor_text: String,
    pub anchor_offset: i32,
    pub is_submitted: bool,
    pub resolved_page_id: String,
    pub resolved_by: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a mark.
#[derive(Debug, Clone)]
pub struct CreateMark<'a> {
    pub page_id: &'a str,
    pub edit: EditNum,
    pub mark_type: &'a str,
    pub creator_id: &'a str,
    pub text: &'a str,
    pub anchor_context: &'a str,
    pub anchor_text: &'a str,
    pub anchor_offset: i32,
    pub is_submitted: bool,
}
