//! Durable task queue backed by the `tasks` table.
//!
//! A task is runnable once `leased_until` has passed. Leasing pushes
//! `leased_until` forward, so a worker that dies mid-task simply lets the
//! lease expire and another worker picks the row up again.

use std::time::Duration;

use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::task::TaskRow;

const COLUMNS: &str = "id, tag, payload, unique_name, leased_until, attempts, created_at";

pub struct TaskRepo;

impl TaskRepo {
    /// Add a task runnable after `delay`.
    pub async fn enqueue(
        executor: impl PgExecutor<'_>,
        tag: &str,
        payload: &serde_json::Value,
        delay: Duration,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO tasks (tag, payload, leased_until) \
             VALUES ($1, $2, NOW() + make_interval(secs => $3)) \
             RETURNING id",
        )
        .bind(tag)
        .bind(payload)
        .bind(delay.as_secs_f64())
        .fetch_one(executor)
        .await
    }

    /// Add a singleton task. Returns false if a task with the same name is
    /// already queued.
    pub async fn enqueue_named(
        executor: impl PgExecutor<'_>,
        tag: &str,
        payload: &serde_json::Value,
        unique_name: &str,
        delay: Duration,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tasks (tag, payload, unique_name, leased_until) \
             VALUES ($1, $2, $3, NOW() + make_interval(secs => $4)) \
             ON CONFLICT (unique_name) WHERE unique_name IS NOT NULL DO NOTHING",
        )
        .bind(tag)
        .bind(payload)
        .bind(unique_name)
        .bind(delay.as_secs_f64())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Claim the oldest runnable task for `lease`.
    pub async fn lease_next(
        executor: impl PgExecutor<'_>,
        lease: Duration,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET \
                 leased_until = NOW() + make_interval(secs => $1), \
                 attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE leased_until <= NOW() \
                 ORDER BY leased_until, id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(lease.as_secs_f64())
            .fetch_optional(executor)
            .await
    }

    /// Make a leased task runnable again after `delay`.
    pub async fn reschedule(
        executor: impl PgExecutor<'_>,
        id: DbId,
        delay: Duration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET leased_until = NOW() + make_interval(secs => $2) WHERE id = $1",
        )
        .bind(id)
        .bind(delay.as_secs_f64())
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_tag(executor: impl PgExecutor<'_>, tag: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE tag = $1")
            .bind(tag)
            .fetch_one(executor)
            .await
    }
}
