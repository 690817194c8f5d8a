//! Repository for the `updates` table (user notifications).

use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::update::{CreateUpdate, UpdateListRow};

pub struct UpdateRepo;

impl UpdateRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateUpdate<'_>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO updates \
                 (user_id, by_user_id, type, group_by_page_id, group_by_user_id, \
                  subscribed_to_id, go_to_page_id, mark_id, change_log_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.by_user_id)
        .bind(input.update_type.as_str())
        .bind(input.group_by_page_id)
        .bind(input.group_by_user_id)
        .bind(input.subscribed_to_id)
        .bind(input.go_to_page_id)
        .bind(input.mark_id)
        .bind(input.change_log_id)
        .fetch_one(executor)
        .await
    }

    /// Undismissed updates for a user, newest first, with the liveness of
    /// the pages they point to. `pending_email` restricts to unseen updates
    /// that were never emailed.
    pub async fn list_for_user(
        executor: impl PgExecutor<'_>,
        user_id: &str,
        pending_email: bool,
        limit: i64,
    ) -> Result<Vec<UpdateListRow>, sqlx::Error> {
        sqlx::query_as::<_, UpdateListRow>(
            "SELECT u.id, u.user_id, u.by_user_id, u.type, u.group_by_page_id, \
                    u.group_by_user_id, u.subscribed_to_id, u.go_to_page_id, \
                    u.mark_id, u.change_log_id, u.seen, \
                    CASE WHEN u.group_by_page_id <> '' \
                         THEN COALESCE(gp.current_edit > 0 AND NOT gp.is_deleted, FALSE) \
                         ELSE TRUE END AS is_group_by_object_alive, \
                    COALESCE(tp.current_edit > 0 AND NOT tp.is_deleted, FALSE) AS is_go_to_page_alive, \
                    u.created_at \
             FROM updates AS u \
             LEFT JOIN page_infos AS gp ON gp.page_id = u.group_by_page_id \
             LEFT JOIN page_infos AS tp ON tp.page_id = u.go_to_page_id \
             WHERE u.user_id = $1 AND NOT u.dismissed \
               AND (NOT $2 OR (NOT u.seen AND NOT u.emailed)) \
             ORDER BY u.created_at DESC, u.id DESC \
             LIMIT $3",
        )
        .bind(user_id)
        .bind(pending_email)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    pub async fn count_unseen(
        executor: impl PgExecutor<'_>,
        user_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM updates WHERE user_id = $1 AND NOT seen AND NOT dismissed",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn mark_all_seen(
        executor: impl PgExecutor<'_>,
        user_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE updates SET seen = TRUE WHERE user_id = $1 AND NOT seen")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Dismiss one update owned by `user_id`. Returns false if none matched.
    pub async fn dismiss(
        executor: impl PgExecutor<'_>,
        user_id: &str,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE updates SET dismissed = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_emailed(
        executor: impl PgExecutor<'_>,
        user_id: &str,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE updates SET emailed = TRUE WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
