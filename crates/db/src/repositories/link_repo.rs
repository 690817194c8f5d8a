//! Outgoing links of each page's live edit.

use sqlx::{PgConnection, PgExecutor};

pub struct LinkRepo;

impl LinkRepo {
    /// Replace every link of `parent_id` with `links`.
    pub async fn replace_for_page(
        conn: &mut PgConnection,
        parent_id: &str,
        links: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM links WHERE parent_id = $1")
            .bind(parent_id)
            .execute(&mut *conn)
            .await?;

        if links.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO links (parent_id, child_alias) \
             SELECT $1, l FROM UNNEST($2::TEXT[]) AS l \
             ON CONFLICT DO NOTHING",
        )
        .bind(parent_id)
        .bind(links)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn list_for_page(
        executor: impl PgExecutor<'_>,
        parent_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT child_alias FROM links WHERE parent_id = $1 ORDER BY child_alias",
        )
        .bind(parent_id)
        .fetch_all(executor)
        .await
    }

    /// Pages linking to `child_alias`.
    pub async fn list_linking_pages(
        executor: impl PgExecutor<'_>,
        child_alias: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT parent_id FROM links WHERE child_alias = lower($1) ORDER BY parent_id",
        )
        .bind(child_alias)
        .fetch_all(executor)
        .await
    }
}
