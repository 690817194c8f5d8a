//! Route definitions for the `/updates` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::updates;
use crate::state::AppState;

/// Routes mounted at `/updates`.
///
/// ```text
/// GET    /                -> list_updates
/// POST   /seen            -> mark_seen
/// POST   /{id}/dismiss    -> dismiss
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(updates::list_updates))
        .route("/seen", post(updates::mark_seen))
        .route("/{id}/dismiss", post(updates::dismiss))
}
