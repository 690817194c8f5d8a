use folio_core::updates::UpdateType;
use folio_db::models::update::CreateUpdate;
use folio_db::repositories::{UpdateRepo, UserRepo};

use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::{AtMentionUpdateTask, TaskOutcome};

/// Notify one mentioned user. Mentions of unknown users are dropped.
pub async fn run(
    ctx: &TaskContext,
    task: &AtMentionUpdateTask,
) -> Result<TaskOutcome, TaskError> {
    if task.mentioned_user_id == task.user_id {
        return Ok(TaskOutcome::Done);
    }
    if UserRepo::find_by_id(&ctx.pool, &task.mentioned_user_id)
        .await?
        .is_none()
    {
        tracing::debug!(
            mentioned_user_id = %task.mentioned_user_id,
            "Mentioned user does not exist"
        );
        return Ok(TaskOutcome::Done);
    }

    UpdateRepo::create(
        &ctx.pool,
        &CreateUpdate {
            user_id: &task.mentioned_user_id,
            by_user_id: &task.user_id,
            update_type: UpdateType::AtMention,
            group_by_page_id: &task.group_by_page_id,
            group_by_user_id: "",
            subscribed_to_id: &task.mentioned_user_id,
            go_to_page_id: &task.go_to_page_id,
            mark_id: None,
            change_log_id: None,
        },
    )
    .await?;
    Ok(TaskOutcome::Done)
}
