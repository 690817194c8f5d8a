//! Keep the external search index in step with live pages.

use folio_db::repositories::SearchRepo;

use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::TaskOutcome;

/// Index the page's live edit, or drop it if it has none.
pub async fn update(ctx: &TaskContext, page_id: &str) -> Result<TaskOutcome, TaskError> {
    if !ctx.search.is_enabled() {
        return Ok(TaskOutcome::Done);
    }
    match SearchRepo::load_document(&ctx.pool, page_id).await? {
        Some(document) => ctx.search.upsert(&document).await?,
        None => ctx.search.remove(page_id).await?,
    }
    tracing::debug!(page_id, "Search index updated");
    Ok(TaskOutcome::Done)
}

pub async fn remove(ctx: &TaskContext, page_id: &str) -> Result<TaskOutcome, TaskError> {
    ctx.search.remove(page_id).await?;
    Ok(TaskOutcome::Done)
}
