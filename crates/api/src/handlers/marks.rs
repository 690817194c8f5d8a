//! Handler for reader marks.

use axum::extract::State;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::marks::NewMark;
use folio_core::visibility::PageInfoFilter;
use folio_db::models::mark::{CreateMark, Mark};
use folio_db::repositories::{MarkRepo, PageInfoRepo};
use folio_events::fanout;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ResultResponse;
use crate::state::AppState;

/// POST /api/newMark
///
/// Typo and confusion marks are submitted immediately and notify the page's
/// subscribers after a delay, so an author can still retract them.
pub async fn new_mark(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewMark>,
) -> AppResult<Json<ResultResponse<Mark>>> {
    let mark_type = input.validate()?;

    let page = PageInfoRepo::find_visible(
        &state.pool,
        &input.page_id,
        PageInfoFilter::for_viewer(&auth.viewer),
    )
    .await?
    .ok_or_else(|| CoreError::page_not_found(input.page_id.as_str()))?;

    let edit = if input.edit > 0 {
        input.edit
    } else {
        page.current_edit
    };
    let is_submitted = mark_type.is_auto_submitted();

    let mark = MarkRepo::create(
        &state.pool,
        &CreateMark {
            page_id: &page.page_id,
            edit,
            mark_type: mark_type.as_str(),
            creator_id: &auth.user_id,
            text: &input.text,
            anchor_context: &input.anchor_context,
            anchor_text: &input.anchor_text,
            anchor_offset: input.anchor_offset,
            is_submitted,
        },
    )
    .await?;

    tracing::info!(mark_id = mark.id, page_id = %page.page_id, mark_type = mark_type.as_str(), "Mark created");

    if is_submitted {
        let (task, delay) = fanout::plan_mark_task(&page.page_id, &auth.user_id, mark.id);
        fanout::enqueue_best_effort(&state.pool, &task, delay).await;
    }

    Ok(Json(ResultResponse::new(mark)))
}
