use folio_core::types::Timestamp;
use sqlx::PgExecutor;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "\
    id, email, name, karma, is_admin, email_frequency, email_threshold, \
    updates_last_emailed_at, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user under an id allocated by [`super::IdRepo`].
    pub async fn create(
        executor: impl PgExecutor<'_>,
        id: &str,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, name, karma, is_admin) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.karma)
            .bind(input.is_admin)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Users with an email address whose digest interval has elapsed.
    pub async fn list_due_for_email(
        executor: impl PgExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE email <> '' AND email_frequency <> 'never' \
               AND (updates_last_emailed_at IS NULL \
                 OR updates_last_emailed_at <= $1 - CASE email_frequency \
                        WHEN 'weekly' THEN INTERVAL '7 days' \
                        WHEN 'daily' THEN INTERVAL '1 day' \
                        ELSE INTERVAL '0 seconds' END) \
             ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(now)
            .fetch_all(executor)
            .await
    }

    pub async fn set_last_emailed(
        executor: impl PgExecutor<'_>,
        id: &str,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET updates_last_emailed_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(executor)
            .await?;
        Ok(())
    }
}
