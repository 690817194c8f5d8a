use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::mark::{CreateMark, Mark};

const COLUMNS: &str = "\
    id, page_id, edit, type, creator_id, text, anchor_context, anchor_text, \
    anchor_offset, is_submitted, resolved_page_id, resolved_by, created_at";

pub struct MarkRepo;

impl MarkRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateMark<'_>,
    ) -> Result<Mark, sqlx::Error> {
        let query = format!(
            "INSERT INTO marks \
                 (page_id, edit, type, creator_id, text, anchor_context, anchor_text, \
                  anchor_offset, is_submitted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mark>(&query)
            .bind(input.page_id)
            .bind(input.edit)
            .bind(input.mark_type)
            .bind(input.creator_id)
            .bind(input.text)
            .bind(input.anchor_context)
            .bind(input.anchor_text)
            .bind(input.anchor_offset)
            .bind(input.is_submitted)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Mark>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM marks WHERE id = $1");
        sqlx::query_as::<_, Mark>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
