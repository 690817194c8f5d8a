use serde::Serialize;
use sqlx::FromRow;
use folio_core::types::{DbId, EditNum, Timestamp};

/// A row from the `page_pairs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePair {
    pub id: DbId,
    pub parent_id: String,
    pub child_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub pair_type: String,
    pub creator_id: String,
    pub ever_published: bool,
    pub created_at: Timestamp,
}

/// The other side of a relationship that has not been published yet.
#[derive(Debug, Clone, FromRow)]
pub struct RelatedPage {
    pub page_id: String,
    pub pair_type: String,
    /// True when `page_id` is the parent side of the pair.
    pub other_is_parent: bool,
    pub current_edit: EditNum,
}
