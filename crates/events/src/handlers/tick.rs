use chrono::Utc;
use folio_db::repositories::PageInfoRepo;

use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::TaskOutcome;

/// Release page locks whose expiry has passed, then run again after the
/// tick interval.
pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome, TaskError> {
    let cleared = PageInfoRepo::clear_expired_locks(&ctx.pool, Utc::now()).await?;
    if cleared > 0 {
        tracing::info!(cleared, "Released expired page locks");
    }
    Ok(TaskOutcome::RetryAfter(ctx.config.tick_interval))
}
