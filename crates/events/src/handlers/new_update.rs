use folio_db::models::update::CreateUpdate;
use folio_db::repositories::{MarkRepo, SubscriptionRepo, UpdateRepo};

use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::{NewUpdateTask, TaskOutcome};

/// Write one update row per subscriber, skipping the actor.
///
/// Mark updates are dropped when the mark no longer exists.
pub async fn run(ctx: &TaskContext, task: &NewUpdateTask) -> Result<TaskOutcome, TaskError> {
    if let Some(mark_id) = task.mark_id {
        if MarkRepo::find_by_id(&ctx.pool, mark_id).await?.is_none() {
            tracing::debug!(mark_id, "Mark gone, skipping update");
            return Ok(TaskOutcome::Done);
        }
    }

    let subscribers =
        SubscriptionRepo::list_subscriber_ids(&ctx.pool, &task.subscribed_to_id).await?;

    let mut tx = ctx.pool.begin().await?;
    let mut created = 0usize;
    for user_id in subscribers.iter().filter(|id| **id != task.user_id) {
        UpdateRepo::create(
            &mut *tx,
            &CreateUpdate {
                user_id,
                by_user_id: &task.user_id,
                update_type: task.update_type,
                group_by_page_id: &task.group_by_page_id,
                group_by_user_id: &task.group_by_user_id,
                subscribed_to_id: &task.subscribed_to_id,
                go_to_page_id: &task.go_to_page_id,
                mark_id: task.mark_id,
                change_log_id: task.change_log_id,
            },
        )
        .await?;
        created += 1;
    }
    tx.commit().await?;

    tracing::debug!(
        update_type = task.update_type.as_str(),
        subscribed_to_id = %task.subscribed_to_id,
        created,
        "Updates created"
    );
    Ok(TaskOutcome::Done)
}
