//! Handlers for page reads and the page write operations.
//!
//! Writes require authentication via [`AuthUser`]; reads accept anonymous
//! viewers through [`MaybeAuthUser`] and are filtered by visibility.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use folio_core::editing::EditSubmission;
use folio_core::error::CoreError;
use folio_core::search::clamp_limit;
use folio_core::types::EditNum;
use folio_core::visibility::PageInfoFilter;
use folio_db::models::change_log::ChangeLog;
use folio_db::models::page::{LivePage, PageEdit};
use folio_db::repositories::{ChangeLogRepo, PageInfoRepo, PageRepo, SummaryRepo};
use serde::{Deserialize, Serialize};

use crate::engine::{self, EditOutcome, NewPageOutcome, NewPageRequest};
use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::ResultResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageIdRequest {
    pub page_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    pub page_id: String,
    pub edit_num: EditNum,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLogQuery {
    pub limit: Option<i64>,
}

const DEFAULT_CHANGE_LOG_LIMIT: i64 = 50;
const MAX_CHANGE_LOG_LIMIT: i64 = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(flatten)]
    pub page: LivePage,
    pub summaries: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub page_id: String,
    /// False when the page was already deleted.
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonResponse {
    pub page_id: String,
    pub autosaves_deleted: u64,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/newPage
pub async fn new_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewPageRequest>,
) -> AppResult<Json<ResultResponse<NewPageOutcome>>> {
    let outcome = engine::new_page(&state, &auth.viewer, input).await?;
    Ok(Json(ResultResponse::new(outcome)))
}

/// POST /api/editPage
///
/// Stale submissions are stored as snapshots and reported through
/// `obsoleteEdit` rather than rejected.
pub async fn edit_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<EditSubmission>,
) -> AppResult<Json<ResultResponse<EditOutcome>>> {
    let outcome = engine::submit_edit(&state, &auth.viewer, input).await?;
    Ok(Json(ResultResponse::new(outcome)))
}

/// POST /api/revertPage
pub async fn revert_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RevertRequest>,
) -> AppResult<Json<ResultResponse<EditOutcome>>> {
    let outcome = engine::revert_page(&state, &auth.viewer, &input.page_id, input.edit_num).await?;
    Ok(Json(ResultResponse::new(outcome)))
}

/// POST /api/deletePage
pub async fn delete_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PageIdRequest>,
) -> AppResult<Json<ResultResponse<DeleteResponse>>> {
    let deleted = engine::delete_page(&state, &auth.viewer, &input.page_id).await?;
    Ok(Json(ResultResponse::new(DeleteResponse {
        page_id: input.page_id,
        deleted,
    })))
}

/// POST /api/abandonPage
pub async fn abandon_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PageIdRequest>,
) -> AppResult<Json<ResultResponse<AbandonResponse>>> {
    let autosaves_deleted = engine::abandon_page(&state, &auth.viewer, &input.page_id).await?;
    Ok(Json(ResultResponse::new(AbandonResponse {
        page_id: input.page_id,
        autosaves_deleted,
    })))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/pages/{id}
///
/// The live edit of a published, non-deleted page the viewer can see.
pub async fn get_page(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> AppResult<Json<ResultResponse<PageResponse>>> {
    let viewer = auth.viewer();
    let page = PageInfoRepo::find_live_page(&state.pool, &page_id, PageInfoFilter::for_viewer(&viewer))
        .await?
        .ok_or_else(|| CoreError::page_not_found(page_id.as_str()))?;
    let summaries = SummaryRepo::list_for_page(&state.pool, &page_id).await?;

    Ok(Json(ResultResponse::new(PageResponse { page, summaries })))
}

/// GET /api/pages/{id}/edits/{n}
///
/// Any edit by number, including edits of deleted pages. Autosaves are only
/// shown to their author.
pub async fn get_edit(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path((page_id, edit_num)): Path<(String, EditNum)>,
) -> AppResult<Json<ResultResponse<PageEdit>>> {
    let viewer = auth.viewer();
    let filter = PageInfoFilter::for_viewer(&viewer)
        .with_unpublished()
        .with_deleted();
    PageInfoRepo::find_visible(&state.pool, &page_id, filter)
        .await?
        .ok_or_else(|| CoreError::page_not_found(page_id.as_str()))?;

    let edit = PageRepo::find_edit(&state.pool, &page_id, edit_num)
        .await?
        .filter(|e| !e.is_autosave || e.creator_id == viewer.id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "Edit",
            id: format!("{page_id}/{edit_num}"),
        })?;

    Ok(Json(ResultResponse::new(edit)))
}

/// GET /api/pages/{id}/changeLogs
///
/// Newest first, including the history of deleted pages.
pub async fn list_change_logs(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Query(params): Query<ChangeLogQuery>,
) -> AppResult<Json<ResultResponse<Vec<ChangeLog>>>> {
    let viewer = auth.viewer();
    let filter = PageInfoFilter::for_viewer(&viewer).with_deleted();
    PageInfoRepo::find_visible(&state.pool, &page_id, filter)
        .await?
        .ok_or_else(|| CoreError::page_not_found(page_id.as_str()))?;

    let limit = clamp_limit(params.limit, DEFAULT_CHANGE_LOG_LIMIT, MAX_CHANGE_LOG_LIMIT);
    let logs = ChangeLogRepo::list_for_page(&state.pool, &page_id, limit).await?;
    Ok(Json(ResultResponse::new(logs)))
}
