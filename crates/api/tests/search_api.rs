//! HTTP-level integration tests for `/api/search`.
//!
//! The test app runs without an external index, so these exercise the
//! Postgres full-text fallback.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, create_user, get, get_auth, new_page, publish};
use folio_core::pages::DomainRole;
use folio_db::repositories::DomainRepo;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_query_returns_nothing(pool: PgPool) {
    let response = get(build_test_app(pool), "/api/search?q=").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finds_live_pages_by_prefix(pool: PgPool) {
    let author = create_user(&pool, "alexei", 500).await;
    let bayes = new_page(build_test_app(pool.clone()), &author, json!({})).await;
    publish(
        build_test_app(pool.clone()),
        &author,
        &bayes,
        0,
        "Bayes' rule",
        "Update beliefs with evidence.",
    )
    .await;
    let other = new_page(build_test_app(pool.clone()), &author, json!({})).await;
    publish(build_test_app(pool.clone()), &author, &other, 0, "Logic", "Syllogisms.").await;

    let response = get(build_test_app(pool), "/api/search?q=bay").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let results = json["result"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["pageId"], bayes);
    assert_eq!(results[0]["title"], "Bayes' rule");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_respects_domain_visibility(pool: PgPool) {
    let member = create_user(&pool, "member", 500).await;
    DomainRepo::set_member_role(&pool, "5", &member.id, DomainRole::Default)
        .await
        .unwrap();
    let page_id = new_page(
        build_test_app(pool.clone()),
        &member,
        json!({"seeDomainId": "5"}),
    )
    .await;
    publish(build_test_app(pool.clone()), &member, &page_id, 0, "Secret bayes", "x").await;

    let response = get(build_test_app(pool.clone()), "/api/search?q=bayes").await;
    let json = body_json(response).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 0);

    let response = get_auth(build_test_app(pool), "/api/search?q=bayes", &member.token).await;
    let json = body_json(response).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 1);
}
