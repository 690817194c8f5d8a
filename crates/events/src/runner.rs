//! Background task runner.
//!
//! [`TaskRunner::run`] leases one task at a time from the `tasks` table,
//! executes it under a timeout, and applies the [`TaskOutcome`]. The loop
//! exits between tasks when the [`CancellationToken`] is cancelled.

use std::sync::Arc;

use folio_core::links::LinkResolver;
use folio_db::repositories::TaskRepo;
use folio_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::delivery::email::EmailDelivery;
use crate::error::TaskError;
use crate::handlers;
use crate::queue;
use crate::search::SearchIndex;
use crate::tasks::{EmailUpdatesTask, Task, TaskOutcome, TickTask};

/// Everything a task handler may use.
pub struct TaskContext {
    pub pool: DbPool,
    pub search: Arc<dyn SearchIndex>,
    /// `None` when SMTP is not configured.
    pub email: Option<EmailDelivery>,
    pub resolver: LinkResolver,
    pub config: WorkerConfig,
}

pub struct TaskRunner {
    ctx: Arc<TaskContext>,
}

impl TaskRunner {
    pub fn new(ctx: TaskContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Make sure the self-rescheduling tasks exist.
    pub async fn seed_recurring_tasks(&self) -> Result<(), TaskError> {
        for task in [Task::Tick(TickTask {}), Task::EmailUpdates(EmailUpdatesTask {})] {
            if queue::enqueue_recurring(&self.ctx.pool, &task).await? {
                tracing::info!(tag = task.tag(), "Seeded recurring task");
            }
        }
        Ok(())
    }

    /// Run until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_ms = self.ctx.config.poll_interval.as_millis() as u64,
            lease_secs = self.ctx.config.lease.as_secs(),
            "Task runner started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let idle = match self.run_once().await {
                Ok(ran) => !ran,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to lease task");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.ctx.config.poll_interval) => {}
                }
            }
        }

        tracing::info!("Task runner stopped");
    }

    /// Lease and execute a single task. Returns false if the queue had
    /// nothing runnable.
    pub async fn run_once(&self) -> Result<bool, sqlx::Error> {
        let pool = &self.ctx.pool;
        let Some(row) = TaskRepo::lease_next(pool, self.ctx.config.lease).await? else {
            return Ok(false);
        };

        let task = match Task::decode(&row.tag, row.payload) {
            Ok(task) => task,
            Err(e) => {
                tracing::error!(
                    task_id = row.id,
                    tag = %row.tag,
                    error = %e,
                    "Dropping undecodable task"
                );
                TaskRepo::delete(pool, row.id).await?;
                return Ok(true);
            }
        };

        if let Err(e) = task.validate() {
            tracing::error!(
                task_id = row.id,
                tag = %row.tag,
                error = %e,
                "Dropping invalid task"
            );
            TaskRepo::delete(pool, row.id).await?;
            return Ok(true);
        }

        let timeout = self.ctx.config.task_timeout;
        let outcome = match tokio::time::timeout(timeout, handlers::execute(&self.ctx, &task)).await
        {
            Ok(outcome) => outcome,
            Err(_) => TaskOutcome::Failed(TaskError::Timeout(timeout)),
        };

        match outcome {
            TaskOutcome::Done => {
                TaskRepo::delete(pool, row.id).await?;
                tracing::debug!(task_id = row.id, tag = %row.tag, "Task done");
            }
            TaskOutcome::RetryAfter(delay) => {
                TaskRepo::reschedule(pool, row.id, delay).await?;
                tracing::debug!(
                    task_id = row.id,
                    tag = %row.tag,
                    delay_secs = delay.as_secs(),
                    "Task rescheduled"
                );
            }
            TaskOutcome::Failed(e) => {
                tracing::error!(
                    task_id = row.id,
                    tag = %row.tag,
                    attempts = row.attempts,
                    error = %e,
                    "Task failed, leaving for lease expiry"
                );
            }
        }

        Ok(true)
    }
}
