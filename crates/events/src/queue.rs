//! Validating wrappers around [`TaskRepo`].

use std::time::Duration;

use folio_core::types::DbId;
use folio_db::repositories::TaskRepo;
use sqlx::PgExecutor;

use crate::error::TaskError;
use crate::tasks::Task;

/// Validate and enqueue a task runnable after `delay`.
pub async fn enqueue(
    executor: impl PgExecutor<'_>,
    task: &Task,
    delay: Duration,
) -> Result<DbId, TaskError> {
    task.validate()?;
    let payload = task.payload()?;
    let id = TaskRepo::enqueue(executor, task.tag(), &payload, delay).await?;
    tracing::debug!(task_id = id, tag = task.tag(), "Task enqueued");
    Ok(id)
}

/// Enqueue a singleton task keyed by its tag. Returns false if one is
/// already queued.
pub async fn enqueue_recurring(
    executor: impl PgExecutor<'_>,
    task: &Task,
) -> Result<bool, TaskError> {
    task.validate()?;
    let payload = task.payload()?;
    let inserted =
        TaskRepo::enqueue_named(executor, task.tag(), &payload, task.tag(), Duration::ZERO).await?;
    Ok(inserted)
}
