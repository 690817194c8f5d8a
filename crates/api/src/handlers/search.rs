//! Full-text search over live pages.
//!
//! Queries go to the external index when it is enabled and reachable, and to
//! Postgres `tsquery` matching otherwise. Both paths re-check visibility
//! against the database, so the index never leaks restricted pages.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use folio_core::search::{
    build_tsquery, clamp_limit, clamp_offset, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use folio_core::visibility::{PageInfoFilter, Viewer};
use folio_db::repositories::search_repo::SearchResultRow;
use folio_db::repositories::SearchRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::MaybeAuthUser;
use crate::response::ResultResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/search?q=
pub async fn search(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<ResultResponse<Vec<SearchResultRow>>>> {
    let viewer = auth.viewer();
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);

    if params.q.trim().is_empty() {
        return Ok(Json(ResultResponse::new(Vec::new())));
    }

    if state.search.is_enabled() {
        match state.search.query(&params.q, limit + offset).await {
            Ok(hits) => {
                let scores: HashMap<String, f64> =
                    hits.into_iter().map(|h| (h.page_id, h.score)).collect();
                let results = index_results(&state, &viewer, scores, limit, offset).await?;
                return Ok(Json(ResultResponse::new(results)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search index query failed, falling back to Postgres");
            }
        }
    }

    let Some(tsquery) = build_tsquery(&params.q) else {
        return Ok(Json(ResultResponse::new(Vec::new())));
    };
    let results = SearchRepo::search_live(
        &state.pool,
        &tsquery,
        PageInfoFilter::for_viewer(&viewer),
        limit,
        offset,
    )
    .await?;
    Ok(Json(ResultResponse::new(results)))
}

/// Load index hits through the visibility filter, best score first.
async fn index_results(
    state: &AppState,
    viewer: &Viewer,
    scores: HashMap<String, f64>,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<SearchResultRow>> {
    let ids: Vec<String> = scores.keys().cloned().collect();
    let mut rows =
        SearchRepo::find_visible_by_ids(&state.pool, &ids, PageInfoFilter::for_viewer(viewer))
            .await?;
    for row in &mut rows {
        row.score = scores.get(&row.page_id).copied().unwrap_or_default();
    }
    rows.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.page_id.cmp(&b.page_id))
    });

    Ok(rows
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect())
}
