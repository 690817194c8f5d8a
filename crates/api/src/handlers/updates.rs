//! Handlers for the `/updates` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::Json;
use folio_core::error::CoreError;
use folio_core::search::clamp_limit;
use folio_core::types::DbId;
use folio_core::updates::{group_updates, UpdateGroup, UpdateRow};
use folio_db::repositories::UpdateRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ResultResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    pub limit: Option<i64>,
}

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatesResponse {
    pub groups: Vec<UpdateGroup>,
    pub unseen_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenResponse {
    pub marked_seen: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissResponse {
    pub id: DbId,
}

/// GET /api/updates
///
/// The user's updates, newest first, grouped for display.
pub async fn list_updates(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UpdatesQuery>,
) -> AppResult<Json<ResultResponse<UpdatesResponse>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let rows = UpdateRepo::list_for_user(&state.pool, &auth.user_id, false, limit)
        .await?
        .into_iter()
        .map(UpdateRow::try_from)
        .collect::<Result<Vec<_>, CoreError>>()?;
    let unseen_count = UpdateRepo::count_unseen(&state.pool, &auth.user_id).await?;

    Ok(Json(ResultResponse::new(UpdatesResponse {
        groups: group_updates(&rows),
        unseen_count,
    })))
}

/// POST /api/updates/seen
pub async fn mark_seen(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ResultResponse<SeenResponse>>> {
    let marked_seen = UpdateRepo::mark_all_seen(&state.pool, &auth.user_id).await?;
    Ok(Json(ResultResponse::new(SeenResponse { marked_seen })))
}

/// POST /api/updates/{id}/dismiss
///
/// 404 if the update does not belong to the authenticated user.
pub async fn dismiss(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ResultResponse<DismissResponse>>> {
    let found = UpdateRepo::dismiss(&state.pool, &auth.user_id, id).await?;
    if !found {
        return Err(CoreError::NotFound {
            entity: "Update",
            id: id.to_string(),
        }
        .into());
    }
    Ok(Json(ResultResponse::new(DismissResponse { id })))
}
