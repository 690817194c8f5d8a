//! Integration tests for base-31 id allocation across pages and users.

use folio_db::models::page::CreatePageInfo;
use folio_db::models::user::CreateUser;
use folio_db::repositories::{IdRepo, PageInfoRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(name: &str) -> CreateUser {
    CreateUser {
        email: format!("{name}@example.com"),
        name: name.to_string(),
        karma: 0,
        is_admin: false,
    }
}

fn new_page_info(page_id: &str, creator: &str) -> CreatePageInfo {
    CreatePageInfo {
        page_id: page_id.to_string(),
        alias: page_id.to_string(),
        page_type: "wiki".to_string(),
        see_domain_id: "0".to_string(),
        created_by: creator.to_string(),
        locked_until: None,
        is_editor_comment: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_id_is_one(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let id = IdRepo::next_available_id(&mut tx).await.unwrap();
    assert_eq!(id, "1");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ids_shared_between_users_and_pages(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let user_id = IdRepo::next_available_id(&mut tx).await.unwrap();
    UserRepo::create(&mut *tx, &user_id, &new_user("alice"))
        .await
        .unwrap();
    let page_id = IdRepo::next_available_id(&mut tx).await.unwrap();
    PageInfoRepo::create(&mut *tx, &new_page_info(&page_id, &user_id))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(user_id, "1");
    assert_eq!(page_id, "2");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_longer_ids_sort_after_shorter(pool: PgPool) {
    // "9" is the largest single-char id; "1b" is longer and must win.
    UserRepo::create(&pool, "9", &new_user("nine")).await.unwrap();
    UserRepo::create(&pool, "1b", &new_user("oneb")).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let id = IdRepo::next_available_id(&mut tx).await.unwrap();
    assert_eq!(id, "1c");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_increment_carries_past_z(pool: PgPool) {
    UserRepo::create(&pool, "9z", &new_user("nz")).await.unwrap();
    UserRepo::create(&pool, "5x", &new_user("fx")).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let id = IdRepo::next_available_id(&mut tx).await.unwrap();
    assert_eq!(id, "100");
}
