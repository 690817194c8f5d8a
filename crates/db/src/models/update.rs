use sqlx::FromRow;
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use folio_core::updates::{UpdateRow, UpdateType};

/// An `updates` row joined with the liveness of the pages it points to.
#[derive(Debug, Clone, FromRow)]
pub struct UpdateListRow {
    pub id: DbId,
    pub user_id: String,
    pub by_user_id: String,
    #[sqlx(rename = "type")]
    pub update_type: String,
    pub group_by_page_id: String,
    pub group_by_user_id: String,
    pub subscribed_to_id: String,
    pub go_to_page_id: String,
    pub mark_id: Option<DbId>,
    pub change_log_id: Option<DbId>,
    pub seen: bool,
    pub is_group_by_object_alive: bool,
    pub is_go_to_page_alive: bool,
    pub created_at: Timestamp,
}

impl TryFrom<UpdateListRow> for UpdateRow {
    type Error = CoreError;

    fn try_from(row: UpdateListRow) -> Result<Self, Self::Error> {
        Ok(UpdateRow {
            id: row.id,
            user_id: row.user_id,
            by_user_id: row.by_user_id,
            update_type: row.update_type.parse::<UpdateType>()?,
            group_by_page_id: row.group_by_page_id,
            group_by_user_id: row.group_by_user_id,
            subscribed_to_id: row.subscribed_to_id,
            go_to_page_id: row.go_to_page_id,
            mark_id: row.mark_id,
            change_log_id: row.change_log_id,
            seen: row.seen,
            is_group_by_object_alive: row.is_group_by_object_alive,
            is_go_to_page_alive: row.is_go_to_page_alive,
            created_at: row.created_at,
        })
    }
}

/// DTO for inserting one update row.
#[derive(Debug, Clone)]
pub struct CreateUpdate<'a> {
    pub user_id: &'a str,
    pub by_user_id: &'a str,
    pub update_type: UpdateType,
    pub group_by_page_id: &'a str,
    pub group_by_user_id: &'a str,
    pub subscribed_to_id: &'a str,
    pub go_to_page_id: &'a str,
    pub mark_id: Option<DbId>,
    pub change_log_id: Option<DbId>,
}
