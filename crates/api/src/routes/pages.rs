//! Route definitions for page operations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{marks, pages};
use crate::state::AppState;

/// Routes merged at the `/api` root.
///
/// ```text
/// POST   /newPage                    -> new_page
/// POST   /editPage                   -> edit_page
/// POST   /revertPage                 -> revert_page
/// POST   /deletePage                 -> delete_page
/// POST   /abandonPage                -> abandon_page
/// POST   /newMark                    -> new_mark
/// GET    /pages/{id}                 -> get_page
/// GET    /pages/{id}/edits/{n}       -> get_edit
/// GET    /pages/{id}/changeLogs      -> list_change_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/newPage", post(pages::new_page))
        .route("/editPage", post(pages::edit_page))
        .route("/revertPage", post(pages::revert_page))
        .route("/deletePage", post(pages::delete_page))
        .route("/abandonPage", post(pages::abandon_page))
        .route("/newMark", post(marks::new_mark))
        .route("/pages/{id}", get(pages::get_page))
        .route("/pages/{id}/edits/{n}", get(pages::get_edit))
        .route("/pages/{id}/changeLogs", get(pages::list_change_logs))
}
