pub mod health;
pub mod pages;
pub mod updates;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /newPage /editPage /revertPage     page writes (auth required)
/// /deletePage /abandonPage
/// /newMark                           reader marks (auth required)
/// /pages/{id}                        live page (visibility-filtered)
/// /pages/{id}/edits/{n}              one edit by number
/// /pages/{id}/changeLogs             page history
/// /updates                           grouped updates (auth required)
/// /updates/seen                      mark all seen
/// /updates/{id}/dismiss              dismiss one update
/// /search?q=                         full-text search (visibility-filtered)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(pages::router())
        .nest("/updates", updates::router())
        .route("/search", get(handlers::search::search))
}
