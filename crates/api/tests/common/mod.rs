#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use folio_api::auth::jwt::{generate_access_token, JwtConfig};
use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_core::links::LinkResolver;
use folio_db::models::user::CreateUser;
use folio_db::repositories::{IdRepo, UserRepo};
use folio_events::search::DisabledSearchIndex;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const SITE_ADDRESS: &str = "http://folio.test";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        site_address: SITE_ADDRESS.to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The production router over `pool`, with the external search index disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        resolver: Arc::new(LinkResolver::new(SITE_ADDRESS).unwrap()),
        search: Arc::new(DisabledSearchIndex),
    };
    build_app_router(state)
}

/// A user created directly in the database, with a bearer token.
pub struct TestUser {
    pub id: String,
    pub token: String,
}

pub async fn create_user(pool: &PgPool, name: &str, karma: i32) -> TestUser {
    let mut tx = pool.begin().await.unwrap();
    let id = IdRepo::next_available_id(&mut tx).await.unwrap();
    let input = CreateUser {
        email: format!("{name}@folio.test"),
        name: name.to_string(),
        karma,
        is_admin: false,
    };
    UserRepo::create(&mut *tx, &id, &input).await.unwrap();
    tx.commit().await.unwrap();

    let token = generate_access_token(&id, "user", &test_config().jwt).unwrap();
    TestUser { id, token }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Page helpers
// ---------------------------------------------------------------------------

/// Create a page through the API and return its id.
pub async fn new_page(app: Router, user: &TestUser, body: serde_json::Value) -> String {
    let response = post_json_auth(app, "/api/newPage", body, &user.token).await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    json["result"]["pageId"].as_str().unwrap().to_string()
}

/// Submit a live edit and return the `result` object.
pub async fn publish(
    app: Router,
    user: &TestUser,
    page_id: &str,
    current_edit: i32,
    title: &str,
    text: &str,
) -> serde_json::Value {
    let body = serde_json::json!({
        "pageId": page_id,
        "currentEdit": current_edit,
        "title": title,
        "text": text,
    });
    let response = post_json_auth(app, "/api/editPage", body, &user.token).await;
    assert_eq!(response.status(), 200);
    body_json(response).await["result"].clone()
}

pub async fn count(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}
