//! Repository for the `page_infos` table.

use folio_core::types::Timestamp;
use folio_core::visibility::PageInfoFilter;
use folio_core::query::QueryPart;
use sqlx::PgExecutor;

use crate::bind::bind_query_as;
use crate::models::page::{CreatePageInfo, LivePage, PageInfo, PageInfoEditUpdate};

/// Column list for `page_infos` queries, prefixed for joins.
const COLUMNS: &str = "\
    pi.page_id, pi.alias, pi.type, pi.see_domain_id, pi.edit_domain_id, \
    pi.is_deleted, pi.merged_into, pi.current_edit, pi.max_edit, \
    pi.locked_by, pi.locked_until, pi.edit_karma_lock, pi.external_url, \
    pi.is_editor_comment, pi.created_at, pi.created_by";

const LIVE_PAGE_COLUMNS: &str = "\
    pi.page_id, pi.alias, pi.type, pi.see_domain_id, pi.is_deleted, \
    pi.current_edit, pi.max_edit, pi.locked_by, pi.locked_until, \
    pi.edit_karma_lock, pi.created_by, \
    p.title, p.clickbait, p.text, p.meta_text, p.todo_count, p.creator_id, \
    p.created_at AS edit_created_at";

pub struct PageInfoRepo;

impl PageInfoRepo {
    /// Insert the metadata row for a brand-new page. `max_edit` starts at 1
    /// because every new page gets an initial autosave.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreatePageInfo,
    ) -> Result<PageInfo, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_infos AS pi \
                 (page_id, alias, type, see_domain_id, edit_domain_id, max_edit, \
                  created_by, locked_by, locked_until, is_editor_comment) \
             VALUES ($1, $2, $3, $4, $4, 1, $5, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PageInfo>(&query)
            .bind(&input.page_id)
            .bind(&input.alias)
            .bind(&input.page_type)
            .bind(&input.see_domain_id)
            .bind(&input.created_by)
            .bind(input.locked_until)
            .bind(input.is_editor_comment)
            .fetch_one(executor)
            .await
    }

    /// Unfiltered lookup, for system use.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Option<PageInfo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_infos AS pi WHERE pi.page_id = $1");
        sqlx::query_as::<_, PageInfo>(&query)
            .bind(page_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the row for the rest of the transaction.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Option<PageInfo>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM page_infos AS pi WHERE pi.page_id = $1 FOR UPDATE");
        sqlx::query_as::<_, PageInfo>(&query)
            .bind(page_id)
            .fetch_optional(executor)
            .await
    }

    /// Lookup restricted by a visibility filter.
    pub async fn find_visible(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        filter: PageInfoFilter<'_>,
    ) -> Result<Option<PageInfo>, sqlx::Error> {
        let part = filter
            .with_prefix("pi.")
            .with_extra(QueryPart::new("pi.page_id = ?").arg(page_id))
            .to_query();
        let (predicate, _) = part.render(1);
        let query = format!("SELECT {COLUMNS} FROM page_infos AS pi WHERE {predicate}");
        bind_query_as(sqlx::query_as::<_, PageInfo>(&query), part.args())
            .fetch_optional(executor)
            .await
    }

    /// Metadata joined with the live edit, restricted by a visibility filter.
    pub async fn find_live_page(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        filter: PageInfoFilter<'_>,
    ) -> Result<Option<LivePage>, sqlx::Error> {
        let part = filter
            .with_prefix("pi.")
            .with_extra(QueryPart::new("pi.page_id = ?").arg(page_id))
            .to_query();
        let (predicate, _) = part.render(1);
        let query = format!(
            "SELECT {LIVE_PAGE_COLUMNS} \
             FROM page_infos AS pi \
             JOIN pages AS p ON p.page_id = pi.page_id AND p.is_live_edit \
             WHERE {predicate}"
        );
        bind_query_as(sqlx::query_as::<_, LivePage>(&query), part.args())
            .fetch_optional(executor)
            .await
    }

    /// Stored `(alias, page_id)` pairs for the given alias spellings.
    pub async fn resolve_aliases(
        executor: impl PgExecutor<'_>,
        aliases: &[String],
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        if aliases.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, (String, String)>(
            "SELECT alias, page_id FROM page_infos WHERE alias = ANY($1)",
        )
        .bind(aliases)
        .fetch_all(executor)
        .await
    }

    /// Record the effects of a newly written edit.
    pub async fn apply_edit(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        update: &PageInfoEditUpdate,
    ) -> Result<(), sqlx::Error> {
        let (locked_by, locked_until) = match &update.lock {
            Some((user, until)) => (Some(user.as_str()), Some(*until)),
            None => (None, None),
        };
        sqlx::query(
            "UPDATE page_infos SET \
                 max_edit = GREATEST(max_edit, $2), \
                 current_edit = COALESCE($3, current_edit), \
                 is_deleted = CASE WHEN $4 THEN FALSE ELSE is_deleted END, \
                 merged_into = CASE WHEN $4 THEN '' ELSE merged_into END, \
                 created_by = COALESCE($5, created_by), \
                 created_at = CASE WHEN $5::TEXT IS NOT NULL THEN NOW() ELSE created_at END, \
                 locked_by = COALESCE($6, locked_by), \
                 locked_until = CASE WHEN $8 THEN NOW() ELSE COALESCE($7, locked_until) END \
             WHERE page_id = $1",
        )
        .bind(page_id)
        .bind(update.max_edit)
        .bind(update.current_edit)
        .bind(update.undelete)
        .bind(update.first_published_by.as_deref())
        .bind(locked_by)
        .bind(locked_until)
        .bind(update.release_lock)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Flag a page deleted. Returns false if it already was.
    pub async fn mark_deleted(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE page_infos SET is_deleted = TRUE WHERE page_id = $1 AND NOT is_deleted",
        )
        .bind(page_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// End the current lock on a page.
    pub async fn release_lock(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE page_infos SET locked_until = NOW() WHERE page_id = $1")
            .bind(page_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Clear locks whose expiry has passed. Returns the number cleared.
    pub async fn clear_expired_locks(
        executor: impl PgExecutor<'_>,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE page_infos SET locked_by = '', locked_until = NULL \
             WHERE locked_until IS NOT NULL AND locked_until < $1",
        )
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_alias(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        alias: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE page_infos SET alias = $2 WHERE page_id = $1")
            .bind(page_id)
            .bind(alias)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
