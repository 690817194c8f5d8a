use sqlx::PgPool;

/// Connect, migrate and verify every table exists.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    folio_db::health_check(&pool).await.unwrap();

    let tables = [
        "users",
        "page_infos",
        "pages",
        "change_logs",
        "links",
        "page_summaries",
        "page_pairs",
        "page_domain_pairs",
        "domain_members",
        "subscriptions",
        "updates",
        "marks",
        "tasks",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}
