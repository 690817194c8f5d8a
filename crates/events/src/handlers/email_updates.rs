//! Periodic digest emails of unseen updates.

use chrono::Utc;
use folio_core::updates::{group_updates, UpdateRow};
use folio_db::models::user::User;
use folio_db::repositories::{UpdateRepo, UserRepo};

use crate::delivery::email::{digest_body, EmailDelivery};
use crate::error::TaskError;
use crate::runner::TaskContext;
use crate::tasks::TaskOutcome;

/// Most updates listed in one digest.
const MAX_DIGEST_UPDATES: i64 = 100;

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome, TaskError> {
    let next = TaskOutcome::RetryAfter(ctx.config.email_interval);
    let Some(mailer) = &ctx.email else {
        tracing::debug!("SMTP not configured, skipping digests");
        return Ok(next);
    };

    let users = UserRepo::list_due_for_email(&ctx.pool, Utc::now()).await?;
    for user in &users {
        if let Err(e) = send_user_digest(ctx, mailer, user).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send digest");
        }
    }
    Ok(next)
}

async fn send_user_digest(
    ctx: &TaskContext,
    mailer: &EmailDelivery,
    user: &User,
) -> Result<(), TaskError> {
    let rows = UpdateRepo::list_for_user(&ctx.pool, &user.id, true, MAX_DIGEST_UPDATES)
        .await?
        .into_iter()
        .map(UpdateRow::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let groups = group_updates(&rows);
    let count: usize = groups.iter().map(|g| g.updates.len()).sum();
    if count == 0 || (count as i64) < i64::from(user.email_threshold) {
        return Ok(());
    }

    let body = digest_body(&ctx.config.site_address, &groups);
    mailer.send_digest(&user.email, count, body).await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    UpdateRepo::mark_emailed(&ctx.pool, &user.id, &ids).await?;
    UserRepo::set_last_emailed(&ctx.pool, &user.id, Utc::now()).await?;
    Ok(())
}
