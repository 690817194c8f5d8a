//! Creating, abandoning and deleting pages.

use chrono::Utc;
use folio_core::error::CoreError;
use folio_core::ids::is_id_valid;
use folio_core::links::is_alias_valid;
use folio_core::pages::{
    delete_access, page_quick_locked_until, ChangeLogType, PageType, PairType, UNIVERSAL_DOMAIN_ID,
};
use folio_core::types::EditNum;
use folio_core::visibility::Viewer;
use folio_db::models::change_log::CreateChangeLog;
use folio_db::models::page::CreatePageInfo;
use folio_db::repositories::{ChangeLogRepo, IdRepo, PageInfoRepo, PageRepo, PairRepo};
use folio_events::fanout;
use serde::{Deserialize, Serialize};

use super::editing::lock_visible_page;
use crate::error::AppResult;
use crate::state::AppState;

/// Request body for `POST /newPage`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPageRequest {
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    /// Defaults to the allocated id.
    pub alias: Option<String>,
    pub see_domain_id: Option<String>,
    /// Pages this one is created under, e.g. the page a comment discusses.
    pub parent_ids: Vec<String>,
    pub is_editor_comment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPageOutcome {
    pub page_id: String,
    pub alias: String,
    pub edit: EditNum,
}

fn require_login(viewer: &Viewer, action: &str) -> AppResult<()> {
    if viewer.is_anonymous() {
        return Err(CoreError::Unauthorized(format!("Have to be logged in to {action}")).into());
    }
    Ok(())
}

/// Allocate an id and create an unpublished page with an empty autosave.
pub async fn new_page(
    state: &AppState,
    viewer: &Viewer,
    request: NewPageRequest,
) -> AppResult<NewPageOutcome> {
    require_login(viewer, "create a page")?;

    let page_type = match request.page_type.as_deref() {
        Some(t) => t.parse::<PageType>()?,
        None => PageType::Wiki,
    };
    let see_domain_id = request
        .see_domain_id
        .unwrap_or_else(|| UNIVERSAL_DOMAIN_ID.to_string());
    if !viewer.can_see_domain(&see_domain_id) {
        return Err(CoreError::Forbidden(format!(
            "Not a member of domain '{see_domain_id}'"
        ))
        .into());
    }
    if let Some(alias) = &request.alias {
        if !is_alias_valid(alias) {
            return Err(CoreError::Validation(format!("Invalid alias: '{alias}'")).into());
        }
    }
    if let Some(bad) = request.parent_ids.iter().find(|id| !is_id_valid(id)) {
        return Err(CoreError::Validation(format!("Invalid parent id: '{bad}'")).into());
    }

    let mut tx = state.pool.begin().await?;
    let page_id = IdRepo::next_available_id(&mut tx).await?;

    let info = PageInfoRepo::create(
        &mut *tx,
        &CreatePageInfo {
            page_id: page_id.clone(),
            alias: request.alias.unwrap_or_else(|| page_id.clone()),
            page_type: page_type.as_str().to_string(),
            see_domain_id,
            created_by: viewer.id.clone(),
            locked_until: Some(page_quick_locked_until(Utc::now())),
            is_editor_comment: request.is_editor_comment,
        },
    )
    .await?;
    PageRepo::create_initial_autosave(&mut *tx, &page_id, &viewer.id).await?;

    for parent_id in &request.parent_ids {
        let parent = PageInfoRepo::find_by_id(&mut *tx, parent_id)
            .await?
            .filter(|p| viewer.can_see_domain(&p.see_domain_id))
            .ok_or_else(|| CoreError::page_not_found(parent_id.as_str()))?;
        PairRepo::create(
            &mut *tx,
            &parent.page_id,
            &page_id,
            PairType::Parent,
            &viewer.id,
            false,
        )
        .await?;
    }

    tx.commit().await?;
    tracing::info!(page_id = %page_id, page_type = %page_type, user_id = %viewer.id, "Page created");

    Ok(NewPageOutcome {
        page_id,
        alias: info.alias,
        edit: 1,
    })
}

/// Drop the caller's autosaves and release their lock on the page.
pub async fn abandon_page(state: &AppState, viewer: &Viewer, page_id: &str) -> AppResult<u64> {
    require_login(viewer, "abandon a page")?;

    let mut tx = state.pool.begin().await?;
    let info = lock_visible_page(&mut tx, page_id, viewer).await?;
    let deleted = PageRepo::delete_own_autosaves(&mut *tx, page_id, &viewer.id).await?;
    if info.locked_by == viewer.id {
        PageInfoRepo::release_lock(&mut *tx, page_id).await?;
    }
    tx.commit().await?;

    tracing::debug!(page_id, user_id = %viewer.id, deleted, "Autosaves abandoned");
    Ok(deleted)
}

/// Flag a published page deleted. Returns false when it already was.
/// Unpublished drafts are abandoned, not deleted.
///
/// Edit rows stay in place; search removal and relationship cleanup run as
/// tasks after commit.
pub async fn delete_page(state: &AppState, viewer: &Viewer, page_id: &str) -> AppResult<bool> {
    require_login(viewer, "delete a page")?;

    let mut tx = state.pool.begin().await?;
    let info = lock_visible_page(&mut tx, page_id, viewer).await?;
    delete_access(info.edit_karma_lock, viewer.karma, viewer.is_admin).require("delete")?;

    if info.is_deleted {
        tx.rollback().await?;
        return Ok(false);
    }
    if info.current_edit == 0 {
        return Err(CoreError::Validation(
            "Can't delete a page that was never published; abandon it instead".to_string(),
        )
        .into());
    }

    PageInfoRepo::mark_deleted(&mut *tx, page_id).await?;
    ChangeLogRepo::create(
        &mut *tx,
        &CreateChangeLog {
            page_id,
            edit: info.current_edit,
            user_id: &viewer.id,
            log_type: ChangeLogType::DeletePage,
            aux_page_id: "",
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(page_id, user_id = %viewer.id, "Page deleted");
    fanout::enqueue_all(&state.pool, &fanout::plan_delete_tasks(page_id)).await;
    Ok(true)
}
