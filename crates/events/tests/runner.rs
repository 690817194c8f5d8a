//! Integration tests for the task runner against a real database.

use std::time::Duration;

use folio_core::links::LinkResolver;
use folio_core::pages::PairType;
use folio_core::updates::UpdateType;
use folio_db::models::page::CreatePageInfo;
use folio_db::repositories::{
    DomainRepo, PageInfoRepo, PairRepo, SubscriptionRepo, TaskRepo, UpdateRepo,
};
use folio_events::search::build_search_index;
use folio_events::tasks::{NewUpdateTask, PropagateDomainTask, Task, TickTask};
use folio_events::{queue, TaskContext, TaskRunner, WorkerConfig};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn runner(pool: &PgPool) -> TaskRunner {
    TaskRunner::new(TaskContext {
        pool: pool.clone(),
        search: build_search_index(None).unwrap(),
        email: None,
        resolver: LinkResolver::new("http://folio.test").unwrap(),
        config: WorkerConfig::default(),
    })
}

async fn live_page(pool: &PgPool, page_id: &str, page_type: &str) {
    PageInfoRepo::create(
        pool,
        &CreatePageInfo {
            page_id: page_id.to_string(),
            alias: page_id.to_string(),
            page_type: page_type.to_string(),
            see_domain_id: "0".to_string(),
            created_by: "1".to_string(),
            locked_until: None,
            is_editor_comment: false,
        },
    )
    .await
    .unwrap();
    sqlx::query("UPDATE page_infos SET current_edit = 1 WHERE page_id = $1")
        .bind(page_id)
        .execute(pool)
        .await
        .unwrap();
}

async fn queued(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_queue_is_idle(pool: PgPool) {
    assert!(!runner(&pool).run_once().await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_update_fans_out_to_subscribers(pool: PgPool) {
    live_page(&pool, "5dg", "wiki").await;
    for user in ["2", "3", "7"] {
        SubscriptionRepo::subscribe(&pool, user, "5dg").await.unwrap();
    }

    let task = Task::NewUpdate(NewUpdateTask {
        user_id: "7".into(),
        update_type: UpdateType::PageEdit,
        group_by_page_id: "5dg".into(),
        group_by_user_id: String::new(),
        subscribed_to_id: "5dg".into(),
        go_to_page_id: "5dg".into(),
        change_log_id: None,
        mark_id: None,
    });
    queue::enqueue(&pool, &task, Duration::ZERO).await.unwrap();

    assert!(runner(&pool).run_once().await.unwrap());
    assert_eq!(queued(&pool).await, 0);

    assert_eq!(UpdateRepo::list_for_user(&pool, "2", false, 10).await.unwrap().len(), 1);
    assert_eq!(UpdateRepo::list_for_user(&pool, "3", false, 10).await.unwrap().len(), 1);
    // The actor is never notified of their own edit.
    assert!(UpdateRepo::list_for_user(&pool, "7", false, 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_tag_is_dropped(pool: PgPool) {
    TaskRepo::enqueue(&pool, "fixText", &json!({"pageId": "5dg"}), Duration::ZERO)
        .await
        .unwrap();

    assert!(runner(&pool).run_once().await.unwrap());
    assert_eq!(queued(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_payload_is_dropped(pool: PgPool) {
    TaskRepo::enqueue(&pool, "updateSearchIndex", &json!({"pageId": "0"}), Duration::ZERO)
        .await
        .unwrap();

    assert!(runner(&pool).run_once().await.unwrap());
    assert_eq!(queued(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tick_reschedules_itself(pool: PgPool) {
    let runner = runner(&pool);
    assert!(queue::enqueue_recurring(&pool, &Task::Tick(TickTask {}))
        .await
        .unwrap());

    assert!(runner.run_once().await.unwrap());
    assert_eq!(TaskRepo::count_by_tag(&pool, "tick").await.unwrap(), 1);
    // Pushed into the future by the tick interval.
    assert!(!runner.run_once().await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeding_recurring_tasks_is_idempotent(pool: PgPool) {
    let runner = runner(&pool);
    runner.seed_recurring_tasks().await.unwrap();
    runner.seed_recurring_tasks().await.unwrap();
    assert_eq!(TaskRepo::count_by_tag(&pool, "tick").await.unwrap(), 1);
    assert_eq!(TaskRepo::count_by_tag(&pool, "emailUpdates").await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_domain_propagates_to_children(pool: PgPool) {
    live_page(&pool, "5", "domain").await;
    live_page(&pool, "6", "wiki").await;
    live_page(&pool, "7", "wiki").await;
    PairRepo::create(&pool, "5", "6", PairType::Parent, "1", true)
        .await
        .unwrap();
    PairRepo::create(&pool, "6", "7", PairType::Parent, "1", true)
        .await
        .unwrap();

    let task = Task::PropagateDomain(PropagateDomainTask {
        page_id: "5".into(),
        deleted: false,
    });
    queue::enqueue(&pool, &task, Duration::ZERO).await.unwrap();

    let runner = runner(&pool);
    while runner.run_once().await.unwrap() {}

    for page in ["5", "6", "7"] {
        assert_eq!(
            DomainRepo::list_page_domains(&pool, page).await.unwrap(),
            vec!["5".to_string()],
            "page {page}"
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleted_page_releases_children(pool: PgPool) {
    live_page(&pool, "5", "domain").await;
    live_page(&pool, "6", "wiki").await;
    PairRepo::create(&pool, "5", "6", PairType::Parent, "1", true)
        .await
        .unwrap();

    let runner = runner(&pool);
    queue::enqueue(
        &pool,
        &Task::PropagateDomain(PropagateDomainTask {
            page_id: "5".into(),
            deleted: false,
        }),
        Duration::ZERO,
    )
    .await
    .unwrap();
    while runner.run_once().await.unwrap() {}
    assert_eq!(DomainRepo::list_page_domains(&pool, "6").await.unwrap(), vec!["5".to_string()]);

    PageInfoRepo::mark_deleted(&pool, "5").await.unwrap();
    queue::enqueue(
        &pool,
        &Task::PropagateDomain(PropagateDomainTask {
            page_id: "5".into(),
            deleted: true,
        }),
        Duration::ZERO,
    )
    .await
    .unwrap();
    while runner.run_once().await.unwrap() {}

    assert!(PairRepo::list_for_page(&pool, "5").await.unwrap().is_empty());
    assert!(DomainRepo::list_page_domains(&pool, "5").await.unwrap().is_empty());
    assert!(DomainRepo::list_page_domains(&pool, "6").await.unwrap().is_empty());
}
