use sqlx::PgExecutor;

use crate::models::change_log::{ChangeLog, CreateChangeLog};

const COLUMNS: &str = "\
    id, page_id, edit, user_id, type, aux_page_id, \
    old_settings_value, new_settings_value, created_at";

pub struct ChangeLogRepo;

impl ChangeLogRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateChangeLog<'_>,
    ) -> Result<ChangeLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO change_logs (page_id, edit, user_id, type, aux_page_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeLog>(&query)
            .bind(input.page_id)
            .bind(input.edit)
            .bind(input.user_id)
            .bind(input.log_type.as_str())
            .bind(input.aux_page_id)
            .fetch_one(executor)
            .await
    }

    /// Newest first.
    pub async fn list_for_page(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        limit: i64,
    ) -> Result<Vec<ChangeLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_logs WHERE page_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, ChangeLog>(&query)
            .bind(page_id)
            .bind(limit)
            .fetch_all(executor)
            .await
    }
}
