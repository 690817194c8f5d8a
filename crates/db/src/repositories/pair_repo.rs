//! Repository for `page_pairs`: parent, tag, requirement and subject links.

use folio_core::pages::PairType;
use sqlx::PgExecutor;

use crate::models::pair::{PagePair, RelatedPage};

const COLUMNS: &str = "id, parent_id, child_id, type, creator_id, ever_published, created_at";

pub struct PairRepo;

impl PairRepo {
    /// Insert a relationship. A duplicate violates
    /// `uq_page_pairs_parent_child_type`.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        parent_id: &str,
        child_id: &str,
        pair_type: PairType,
        creator_id: &str,
        ever_published: bool,
    ) -> Result<PagePair, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_pairs (parent_id, child_id, type, creator_id, ever_published) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PagePair>(&query)
            .bind(parent_id)
            .bind(child_id)
            .bind(pair_type.as_str())
            .bind(creator_id)
            .bind(ever_published)
            .fetch_one(executor)
            .await
    }

    /// Every pair the page takes part in, on either side.
    pub async fn list_for_page(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Vec<PagePair>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_pairs \
             WHERE parent_id = $1 OR child_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, PagePair>(&query)
            .bind(page_id)
            .fetch_all(executor)
            .await
    }

    /// Pairs of this page never published together, whose other side is a
    /// live page in one of `visible_domains`.
    pub async fn list_unpublished_related(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        visible_domains: &[String],
    ) -> Result<Vec<RelatedPage>, sqlx::Error> {
        sqlx::query_as::<_, RelatedPage>(
            "SELECT o.other_id AS page_id, o.pair_type, o.other_is_parent, pi.current_edit \
             FROM ( \
                 SELECT parent_id AS other_id, type AS pair_type, TRUE AS other_is_parent \
                 FROM page_pairs WHERE child_id = $1 AND NOT ever_published \
                 UNION ALL \
                 SELECT child_id, type, FALSE \
                 FROM page_pairs WHERE parent_id = $1 AND NOT ever_published \
             ) AS o \
             JOIN page_infos AS pi ON pi.page_id = o.other_id \
             WHERE pi.current_edit > 0 AND NOT pi.is_deleted AND pi.see_domain_id = ANY($2)",
        )
        .bind(page_id)
        .bind(visible_domains)
        .fetch_all(executor)
        .await
    }

    /// Flag pairs as published once both sides are live.
    pub async fn mark_published(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE page_pairs AS pp SET ever_published = TRUE \
             FROM page_infos AS pi \
             WHERE NOT pp.ever_published \
               AND ((pp.child_id = $1 AND pi.page_id = pp.parent_id) \
                 OR (pp.parent_id = $1 AND pi.page_id = pp.child_id)) \
               AND pi.current_edit > 0 AND NOT pi.is_deleted",
        )
        .bind(page_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove every pair the page takes part in, returning them.
    pub async fn delete_for_page(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Vec<PagePair>, sqlx::Error> {
        let query = format!(
            "DELETE FROM page_pairs WHERE parent_id = $1 OR child_id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PagePair>(&query)
            .bind(page_id)
            .fetch_all(executor)
            .await
    }

    /// Children of `parent_id` connected by one of `types`.
    pub async fn list_child_ids(
        executor: impl PgExecutor<'_>,
        parent_id: &str,
        types: &[PairType],
    ) -> Result<Vec<String>, sqlx::Error> {
        let types: Vec<&str> = types.iter().map(PairType::as_str).collect();
        sqlx::query_scalar(
            "SELECT DISTINCT child_id FROM page_pairs \
             WHERE parent_id = $1 AND type = ANY($2) ORDER BY child_id",
        )
        .bind(parent_id)
        .bind(&types)
        .fetch_all(executor)
        .await
    }

    /// Live parent pages of a comment, with their page type.
    pub async fn list_live_parents(
        executor: impl PgExecutor<'_>,
        child_id: &str,
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT pi.page_id, pi.type \
             FROM page_pairs AS pp \
             JOIN page_infos AS pi ON pi.page_id = pp.parent_id \
             WHERE pp.child_id = $1 AND pp.type = $2 \
               AND pi.current_edit > 0 AND NOT pi.is_deleted \
             ORDER BY pp.id",
        )
        .bind(child_id)
        .bind(PairType::Parent.as_str())
        .fetch_all(executor)
        .await
    }
}
