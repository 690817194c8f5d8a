use std::collections::BTreeMap;

use sqlx::{PgConnection, PgExecutor};

pub struct SummaryRepo;

impl SummaryRepo {
    /// Replace every named summary of `page_id`.
    pub async fn replace_for_page(
        conn: &mut PgConnection,
        page_id: &str,
        summaries: &BTreeMap<String, String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM page_summaries WHERE page_id = $1")
            .bind(page_id)
            .execute(&mut *conn)
            .await?;

        if summaries.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = summaries.keys().cloned().collect();
        let texts: Vec<String> = summaries.values().cloned().collect();
        sqlx::query(
            "INSERT INTO page_summaries (page_id, name, text) \
             SELECT $1, s.name, s.text FROM UNNEST($2::TEXT[], $3::TEXT[]) AS s(name, text)",
        )
        .bind(page_id)
        .bind(&names)
        .bind(&texts)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn list_for_page(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<BTreeMap<String, String>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT name, text FROM page_summaries WHERE page_id = $1",
        )
        .bind(page_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
