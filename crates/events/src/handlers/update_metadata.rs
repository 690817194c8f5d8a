//! Recompute the derived data of a page's live edit.

use folio_core::text::{extract_summaries, extract_todo_count};
use folio_db::repositories::{LinkRepo, PageRepo, SummaryRepo};

use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::TaskOutcome;

/// Rewrite summaries, todo count and links from the live text.
pub async fn run(ctx: &TaskContext, page_id: &str) -> Result<TaskOutcome, TaskError> {
    let Some(live) = PageRepo::find_live(&ctx.pool, page_id).await? else {
        tracing::debug!(page_id, "No live edit, nothing to update");
        return Ok(TaskOutcome::Done);
    };

    let summaries = extract_summaries(&live.text);
    let links = ctx.resolver.extract_links(&live.text);
    let todo_count = extract_todo_count(&live.text);

    let mut tx = ctx.pool.begin().await?;
    SummaryRepo::replace_for_page(&mut tx, page_id, &summaries).await?;
    LinkRepo::replace_for_page(&mut tx, page_id, &links).await?;
    PageRepo::set_todo_count(&mut *tx, page_id, live.edit, todo_count).await?;
    tx.commit().await?;

    tracing::debug!(page_id, links = links.len(), todo_count, "Page metadata updated");
    Ok(TaskOutcome::Done)
}
