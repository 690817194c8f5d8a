use sqlx::PgExecutor;

pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Subscribe `user_id` to a page or user. Returns false if already subscribed.
    pub async fn subscribe(
        executor: impl PgExecutor<'_>,
        user_id: &str,
        to_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (user_id, to_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(to_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_subscriber_ids(
        executor: impl PgExecutor<'_>,
        to_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM subscriptions WHERE to_id = $1 ORDER BY user_id")
            .bind(to_id)
            .fetch_all(executor)
            .await
    }

    pub async fn is_subscribed(
        executor: impl PgExecutor<'_>,
        user_id: &str,
        to_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND to_id = $2)",
        )
        .bind(user_id)
        .bind(to_id)
        .fetch_one(executor)
        .await
    }
}
