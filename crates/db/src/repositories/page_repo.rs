//! Repository for the `pages` table: one row per edit.

use folio_core::pages::PairType;
use folio_core::types::EditNum;
use sqlx::PgExecutor;

use crate::models::page::{PageEdit, UpsertEdit};

/// Column list for `pages` queries.
const COLUMNS: &str = "\
    page_id, edit, prev_edit, creator_id, title, clickbait, text, meta_text, \
    todo_count, is_live_edit, is_minor_edit, is_autosave, is_snapshot, \
    snapshot_text, anchor_context, anchor_text, anchor_offset, created_at";

pub struct PageRepo;

impl PageRepo {
    /// Fetch an edit by number, live or not, deleted page or not.
    pub async fn find_edit(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        edit: EditNum,
    ) -> Result<Option<PageEdit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE page_id = $1 AND edit = $2");
        sqlx::query_as::<_, PageEdit>(&query)
            .bind(page_id)
            .bind(edit)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_live(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Option<PageEdit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE page_id = $1 AND is_live_edit");
        sqlx::query_as::<_, PageEdit>(&query)
            .bind(page_id)
            .fetch_optional(executor)
            .await
    }

    /// Highest autosave edit the user owns on this page.
    pub async fn max_own_autosave(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        user_id: &str,
    ) -> Result<Option<EditNum>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<EditNum>>(
            "SELECT MAX(edit) FROM pages WHERE page_id = $1 AND creator_id = $2 AND is_autosave",
        )
        .bind(page_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn count_edits(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(executor)
            .await
    }

    pub async fn clear_live_flag(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pages SET is_live_edit = FALSE WHERE page_id = $1 AND is_live_edit")
            .bind(page_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Write an edit row, replacing any existing row with the same number.
    ///
    /// Replacing is how autosaves collapse into one row and how a revert or
    /// undelete re-publishes an existing edit.
    pub async fn upsert_edit(
        executor: impl PgExecutor<'_>,
        input: &UpsertEdit<'_>,
    ) -> Result<(), sqlx::Error> {
        let c = input.content;
        sqlx::query(
            "INSERT INTO pages \
                 (page_id, edit, prev_edit, creator_id, title, clickbait, text, meta_text, \
                  todo_count, is_live_edit, is_minor_edit, is_autosave, is_snapshot, \
                  snapshot_text, anchor_context, anchor_text, anchor_offset) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (page_id, edit) DO UPDATE SET \
                 prev_edit = EXCLUDED.prev_edit, \
                 creator_id = EXCLUDED.creator_id, \
                 title = EXCLUDED.title, \
                 clickbait = EXCLUDED.clickbait, \
                 text = EXCLUDED.text, \
                 meta_text = EXCLUDED.meta_text, \
                 todo_count = EXCLUDED.todo_count, \
                 is_live_edit = EXCLUDED.is_live_edit, \
                 is_minor_edit = EXCLUDED.is_minor_edit, \
                 is_autosave = EXCLUDED.is_autosave, \
                 is_snapshot = EXCLUDED.is_snapshot, \
                 snapshot_text = EXCLUDED.snapshot_text, \
                 anchor_context = EXCLUDED.anchor_context, \
                 anchor_text = EXCLUDED.anchor_text, \
                 anchor_offset = EXCLUDED.anchor_offset, \
                 created_at = NOW()",
        )
        .bind(input.page_id)
        .bind(input.edit)
        .bind(input.prev_edit)
        .bind(input.creator_id)
        .bind(&c.title)
        .bind(&c.clickbait)
        .bind(&c.text)
        .bind(&c.meta_text)
        .bind(input.todo_count)
        .bind(input.is_live_edit)
        .bind(input.is_minor_edit)
        .bind(input.is_autosave)
        .bind(input.is_snapshot)
        .bind(input.snapshot_text)
        .bind(&c.anchor_context)
        .bind(&c.anchor_text)
        .bind(c.anchor_offset)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_todo_count(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        edit: EditNum,
        todo_count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pages SET todo_count = $3 WHERE page_id = $1 AND edit = $2")
            .bind(page_id)
            .bind(edit)
            .bind(todo_count)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Empty autosave edit 1 held by the creator of a new page.
    pub async fn create_initial_autosave(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        creator_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO pages (page_id, edit, prev_edit, creator_id, is_autosave) \
             VALUES ($1, 1, 0, $2, TRUE)",
        )
        .bind(page_id)
        .bind(creator_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_own_autosaves(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        user_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM pages WHERE page_id = $1 AND creator_id = $2 AND is_autosave",
        )
        .bind(page_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Live title of the page's parent, used to prefix lens titles.
    pub async fn lens_parent_title(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT p.title \
             FROM page_pairs AS pp \
             JOIN pages AS p ON p.page_id = pp.parent_id AND p.is_live_edit \
             WHERE pp.child_id = $1 AND pp.type = $2 \
             ORDER BY pp.id \
             LIMIT 1",
        )
        .bind(page_id)
        .bind(PairType::Parent.as_str())
        .fetch_optional(executor)
        .await
    }
}
