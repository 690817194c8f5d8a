//! One module per task variant.

pub mod at_mention;
pub mod email_updates;
pub mod new_update;
pub mod propagate_domain;
pub mod search_sync;
pub mod tick;
pub mod update_metadata;

use crate::runner::TaskContext;
use crate::tasks::{Task, TaskOutcome};

/// Run a validated task.
pub async fn execute(ctx: &TaskContext, task: &Task) -> TaskOutcome {
    let result = match task {
        Task::Tick(_) => tick::run(ctx).await,
        Task::NewUpdate(t) => new_update::run(ctx, t).await,
        Task::AtMentionUpdate(t) => at_mention::run(ctx, t).await,
        Task::PropagateDomain(t) => propagate_domain::run(ctx, t).await,
        Task::UpdateSearchIndex(t) => search_sync::update(ctx, &t.page_id).await,
        Task::RemoveFromSearchIndex(t) => search_sync::remove(ctx, &t.page_id).await,
        Task::UpdateMetadata(t) => update_metadata::run(ctx, &t.page_id).await,
        Task::EmailUpdates(_) => email_updates::run(ctx).await,
    };
    result.unwrap_or_else(TaskOutcome::Failed)
}
