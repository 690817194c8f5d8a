//! Database side of search: the tsquery fallback and index documents.

use folio_core::search::SearchDocument;
use folio_core::visibility::PageInfoFilter;
use folio_core::query::QueryPart;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

use crate::bind::bind_query_as;

/// A visible live page matched by a search.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRow {
    pub page_id: String,
    pub alias: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub clickbait: String,
    pub score: f64,
}

#[derive(Debug, Clone, FromRow)]
struct DocumentRow {
    page_id: String,
    alias: String,
    #[sqlx(rename = "type")]
    page_type: String,
    title: String,
    clickbait: String,
    text: String,
    see_domain_id: String,
    creator_id: String,
}

impl From<DocumentRow> for SearchDocument {
    fn from(row: DocumentRow) -> Self {
        SearchDocument {
            page_id: row.page_id,
            alias: row.alias,
            page_type: row.page_type,
            title: row.title,
            clickbait: row.clickbait,
            text: row.text,
            see_domain_id: row.see_domain_id,
            creator_id: row.creator_id,
        }
    }
}

const SEARCH_VECTOR: &str =
    "to_tsvector('english', p.title || ' ' || p.clickbait || ' ' || p.text)";

pub struct SearchRepo;

impl SearchRepo {
    /// Rank live pages against `tsquery`, keeping only those `filter` admits.
    pub async fn search_live(
        executor: impl PgExecutor<'_>,
        tsquery: &str,
        filter: PageInfoFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SearchResultRow>, sqlx::Error> {
        let matches = QueryPart::new(format!("{SEARCH_VECTOR} @@ to_tsquery('english', ?)"))
            .arg(tsquery);
        let part = filter.with_prefix("pi.").with_extra(matches).to_query();
        let (predicate, next) = part.render(2);
        let query = format!(
            "SELECT pi.page_id, pi.alias, pi.type, p.title, p.clickbait, \
                    ts_rank({SEARCH_VECTOR}, to_tsquery('english', $1))::FLOAT8 AS score \
             FROM page_infos AS pi \
             JOIN pages AS p ON p.page_id = pi.page_id AND p.is_live_edit \
             WHERE {predicate} \
             ORDER BY score DESC, pi.page_id \
             LIMIT ${next} OFFSET ${}",
            next + 1
        );
        bind_query_as(sqlx::query_as::<_, SearchResultRow>(&query).bind(tsquery), part.args())
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Load hits returned by an external index, dropping any `filter` rejects.
    /// Rows come back unordered with a zero score.
    pub async fn find_visible_by_ids(
        executor: impl PgExecutor<'_>,
        page_ids: &[String],
        filter: PageInfoFilter<'_>,
    ) -> Result<Vec<SearchResultRow>, sqlx::Error> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let part = filter
            .with_prefix("pi.")
            .with_extra(QueryPart::new("pi.page_id = ANY(?)").arg(page_ids.to_vec()))
            .to_query();
        let (predicate, _) = part.render(1);
        let query = format!(
            "SELECT pi.page_id, pi.alias, pi.type, p.title, p.clickbait, 0::FLOAT8 AS score \
             FROM page_infos AS pi \
             JOIN pages AS p ON p.page_id = pi.page_id AND p.is_live_edit \
             WHERE {predicate}"
        );
        bind_query_as(sqlx::query_as::<_, SearchResultRow>(&query), part.args())
            .fetch_all(executor)
            .await
    }

    /// The index document for a page, or `None` if it has no live edit or is
    /// deleted.
    pub async fn load_document(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Option<SearchDocument>, sqlx::Error> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT pi.page_id, pi.alias, pi.type, p.title, p.clickbait, p.text, \
                    pi.see_domain_id, p.creator_id \
             FROM page_infos AS pi \
             JOIN pages AS p ON p.page_id = pi.page_id AND p.is_live_edit \
             WHERE pi.page_id = $1 AND NOT pi.is_deleted",
        )
        .bind(page_id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(SearchDocument::from))
    }
}
