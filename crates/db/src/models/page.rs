//! Page metadata (`page_infos`) and edit (`pages`) rows.

use serde::Serialize;
use sqlx::FromRow;
use folio_core::editing::EditContent;
use folio_core::types::{EditNum, Timestamp};

/// A row from the `page_infos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_id: String,
    pub alias: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub page_type: String,
    pub see_domain_id: String,
    pub edit_domain_id: String,
    pub is_deleted: bool,
    pub merged_into: String,
    pub current_edit: EditNum,
    pub max_edit: EditNum,
    pub locked_by: String,
    pub locked_until: Option<Timestamp>,
    pub edit_karma_lock: i32,
    pub external_url: String,
    pub is_editor_comment: bool,
    pub created_at: Timestamp,
    pub created_by: String,
}

/// A row from the `pages` table: one edit of a page.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEdit {
    pub page_id: String,
    pub edit: EditNum,
    pub prev_edit: EditNum,
    pub creator_id: String,
    pub title: String,
    pub clickbait: String,
    pub text: String,
    pub meta_text: String,
    pub todo_count: i32,
    pub is_live_edit: bool,
    pub is_minor_edit: bool,
    pub is_autosave: bool,
    pub is_snapshot: bool,
    pub snapshot_text: String,
    pub anchor_context: String,
    pub anchor_text: String,
    pub anchor_offset: i32,
    pub created_at: Timestamp,
}

impl PageEdit {
    pub fn content(&self) -> EditContent {
        EditContent {
            title: self.title.clone(),
            clickbait: self.clickbait.clone(),
            text: self.text.clone(),
            meta_text: self.meta_text.clone(),
            anchor_context: self.anchor_context.clone(),
            anchor_text: self.anchor_text.clone(),
            anchor_offset: self.anchor_offset,
        }
    }
}

/// DTO for creating a page's metadata row.
#[derive(Debug, Clone)]
pub struct CreatePageInfo {
    pub page_id: String,
    pub alias: String,
    pub page_type: String,
    pub see_domain_id: String,
    pub created_by: String,
    pub locked_until: Option<Timestamp>,
    pub is_editor_comment: bool,
}

/// DTO for writing one edit row.
#[derive(Debug, Clone)]
pub struct UpsertEdit<'a> {
    pub page_id: &'a str,
    pub edit: EditNum,
    pub prev_edit: EditNum,
    pub creator_id: &'a str,
    pub content: &'a EditContent,
    pub todo_count: i32,
    pub is_live_edit: bool,
    pub is_minor_edit: bool,
    pub is_autosave: bool,
    pub is_snapshot: bool,
    pub snapshot_text: &'a str,
}

/// Changes applied to `page_infos` after an edit is written.
#[derive(Debug, Clone, Default)]
pub struct PageInfoEditUpdate {
    pub max_edit: EditNum,
    /// Set for live edits.
    pub current_edit: Option<EditNum>,
    pub undelete: bool,
    /// Creator stamped on first publish.
    pub first_published_by: Option<String>,
    /// Autosaves take the lock until this time.
    pub lock: Option<(String, Timestamp)>,
    /// Live edits release the lock.
    pub release_lock: bool,
}

/// A live page with its metadata, as returned to readers.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePage {
    pub page_id: String,
    pub alias: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub page_type: String,
    pub see_domain_id: String,
    pub is_deleted: bool,
    pub current_edit: EditNum,
    pub max_edit: EditNum,
    pub locked_by: String,
    pub locked_until: Option<Timestamp>,
    pub edit_karma_lock: i32,
    pub created_by: String,
    pub title: String,
    pub clickbait: String,
    pub text: String,
    pub meta_text: String,
    pub todo_count: i32,
    pub creator_id: String,
    pub edit_created_at: Timestamp,
}
