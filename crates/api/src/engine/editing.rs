//! Submitting and reverting edits.
//!
//! [`submit_edit`] runs the whole edit path: lock the page row, plan the
//! edit with [`prepare_edit`], standardize links, skip no-ops, write inside
//! one transaction and enqueue follow-up tasks after commit.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use folio_core::editing::{prepare_edit, CurrentPage, EditPlan, EditSubmission};
use folio_core::error::CoreError;
use folio_core::ids::is_id_valid;
use folio_core::links::extract_mentions;
use folio_core::pages::{page_locked_until, PageType, PairType};
use folio_core::text::{extract_summaries, extract_todo_count};
use folio_core::types::{DbId, EditNum, Timestamp};
use folio_core::visibility::Viewer;
use folio_db::models::change_log::CreateChangeLog;
use folio_db::models::page::{PageInfo, PageInfoEditUpdate, UpsertEdit};
use folio_db::repositories::{
    ChangeLogRepo, LinkRepo, PageInfoRepo, PageRepo, PairRepo, SubscriptionRepo, SummaryRepo,
};
use folio_events::fanout::{self, CommentParent, EditEffects, RelatedChangeLog};
use folio_events::tasks::{PageTask, Task};
use serde::Serialize;
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What the caller gets back from an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub page_id: String,
    /// Edit number written, or the live edit for a no-op.
    pub edit: EditNum,
    pub is_live: bool,
    /// Set when the submission was stale and stored as a snapshot instead;
    /// carries the page's authoritative current edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obsolete_edit: Option<EditNum>,
    pub is_noop: bool,
}

/// Load a page row for writing, hidden pages reported as missing.
pub(crate) async fn lock_visible_page(
    conn: &mut PgConnection,
    page_id: &str,
    viewer: &Viewer,
) -> AppResult<PageInfo> {
    if !is_id_valid(page_id) {
        return Err(CoreError::Validation(format!("Invalid page id: '{page_id}'")).into());
    }
    let info = PageInfoRepo::find_for_update(&mut *conn, page_id)
        .await?
        .ok_or_else(|| CoreError::page_not_found(page_id))?;
    if !viewer.can_see_domain(&info.see_domain_id) {
        return Err(CoreError::page_not_found(page_id).into());
    }
    Ok(info)
}

async fn load_current_page(
    conn: &mut PgConnection,
    info: &PageInfo,
    viewer: &Viewer,
) -> AppResult<CurrentPage> {
    let page_type: PageType = info.page_type.parse()?;
    let live = PageRepo::find_live(&mut *conn, &info.page_id)
        .await?
        .map(|edit| edit.content());
    let own_autosave_edit = PageRepo::max_own_autosave(&mut *conn, &info.page_id, &viewer.id).await?;
    let lens_parent_title = if page_type == PageType::Lens {
        PageRepo::lens_parent_title(&mut *conn, &info.page_id).await?
    } else {
        None
    };

    Ok(CurrentPage {
        page_id: info.page_id.clone(),
        page_type,
        current_edit: info.current_edit,
        max_edit: info.max_edit,
        is_deleted: info.is_deleted,
        edit_karma_lock: info.edit_karma_lock,
        live,
        own_autosave_edit,
        lens_parent_title,
    })
}

/// Rewrite alias references in the planned text to page ids.
async fn standardize_links(
    conn: &mut PgConnection,
    state: &AppState,
    plan: &mut EditPlan,
) -> AppResult<()> {
    let candidates = state.resolver.alias_candidates(&plan.content.text);
    if candidates.is_empty() {
        return Ok(());
    }
    let aliases: HashMap<String, String> = PageInfoRepo::resolve_aliases(&mut *conn, &candidates)
        .await?
        .into_iter()
        .collect();
    plan.content.text = state.resolver.standardize(&plan.content.text, &aliases);
    Ok(())
}

/// Live parents of a comment, with their parsed page types.
async fn comment_parents(conn: &mut PgConnection, page_id: &str) -> AppResult<Vec<CommentParent>> {
    PairRepo::list_live_parents(&mut *conn, page_id)
        .await?
        .into_iter()
        .map(|(page_id, page_type)| {
            Ok(CommentParent {
                page_id,
                page_type: page_type.parse::<PageType>()?,
            })
        })
        .collect()
}

/// Flag relationships that just became visible and log them on the other page.
async fn publish_relationships(
    conn: &mut PgConnection,
    page_id: &str,
    viewer: &Viewer,
) -> AppResult<Vec<RelatedChangeLog>> {
    let related =
        PairRepo::list_unpublished_related(&mut *conn, page_id, &viewer.visible_domain_ids())
            .await?;
    PairRepo::mark_published(&mut *conn, page_id).await?;

    let mut logs = Vec::with_capacity(related.len());
    for other in related {
        let pair_type: PairType = other.pair_type.parse()?;
        let log_type = if other.other_is_parent {
            pair_type.new_child_log()
        } else {
            pair_type.new_parent_log()
        };
        let log = ChangeLogRepo::create(
            &mut *conn,
            &CreateChangeLog {
                page_id: &other.page_id,
                edit: other.current_edit,
                user_id: &viewer.id,
                log_type,
                aux_page_id: page_id,
            },
        )
        .await?;
        logs.push(RelatedChangeLog {
            page_id: other.page_id,
            change_log_id: log.id,
        });
    }
    Ok(logs)
}

/// Submit an edit on behalf of `viewer`.
pub async fn submit_edit(
    state: &AppState,
    viewer: &Viewer,
    submission: EditSubmission,
) -> AppResult<EditOutcome> {
    if viewer.is_anonymous() {
        return Err(CoreError::Unauthorized("Have to be logged in to edit".into()).into());
    }

    let now = Utc::now();
    let mut tx = state.pool.begin().await?;

    let info = lock_visible_page(&mut tx, &submission.page_id, viewer).await?;
    let page = load_current_page(&mut tx, &info, viewer).await?;
    let mut plan = prepare_edit(&page, submission, viewer, now)?;
    standardize_links(&mut tx, state, &mut plan).await?;

    if plan.is_noop(&page) {
        tracing::debug!(page_id = %page.page_id, edit = page.current_edit, "Edit is a no-op");
        tx.rollback().await?;
        return Ok(EditOutcome {
            page_id: page.page_id,
            edit: page.current_edit,
            is_live: true,
            obsolete_edit: None,
            is_noop: true,
        });
    }

    let written = write_edit(&mut tx, state, viewer, &page, &plan, now).await?;
    tx.commit().await?;

    tracing::info!(
        page_id = %plan.page_id,
        edit = plan.edit_num,
        is_live = plan.is_live,
        obsolete_edit = ?plan.obsolete_edit,
        "Edit saved"
    );

    if plan.is_live {
        let mut tasks = fanout::plan_edit_tasks(&EditEffects {
            page_id: plan.page_id.clone(),
            page_type: page.page_type,
            author_id: viewer.id.clone(),
            is_live: plan.is_live,
            is_minor_edit: plan.is_minor_edit,
            is_first_publish: plan.is_first_publish(),
            is_undelete: plan.is_undelete(),
            change_log_id: written.change_log_id,
            comment_parents: written.comment_parents,
            mentions: extract_mentions(&plan.content.text),
            related_change_logs: written.related_change_logs,
        });
        if plan.is_becoming_visible() {
            tasks.extend(linking_page_tasks(state, &info).await);
        }
        fanout::enqueue_all(&state.pool, &tasks).await;
    }

    Ok(EditOutcome {
        page_id: plan.page_id,
        edit: plan.edit_num,
        is_live: plan.is_live,
        obsolete_edit: plan.obsolete_edit,
        is_noop: false,
    })
}

struct WrittenEdit {
    change_log_id: Option<DbId>,
    comment_parents: Vec<CommentParent>,
    related_change_logs: Vec<RelatedChangeLog>,
}

async fn write_edit(
    conn: &mut PgConnection,
    state: &AppState,
    viewer: &Viewer,
    page: &CurrentPage,
    plan: &EditPlan,
    now: Timestamp,
) -> AppResult<WrittenEdit> {
    let page_id = plan.page_id.as_str();
    let text = plan.content.text.as_str();

    if plan.is_live && plan.state.was_published() {
        PageRepo::clear_live_flag(&mut *conn, page_id).await?;
    }

    PageRepo::upsert_edit(
        &mut *conn,
        &UpsertEdit {
            page_id,
            edit: plan.edit_num,
            prev_edit: plan.prev_edit,
            creator_id: &viewer.id,
            content: &plan.content,
            todo_count: extract_todo_count(text),
            is_live_edit: plan.is_live,
            is_minor_edit: plan.is_minor_edit,
            is_autosave: plan.is_autosave,
            is_snapshot: plan.is_snapshot,
            snapshot_text: &plan.snapshot_text,
        },
    )
    .await?;

    let mut related_change_logs = Vec::new();
    if plan.is_live {
        SummaryRepo::replace_for_page(&mut *conn, page_id, &extract_summaries(text)).await?;
        related_change_logs = publish_relationships(&mut *conn, page_id, viewer).await?;
        LinkRepo::replace_for_page(&mut *conn, page_id, &state.resolver.extract_links(text))
            .await?;
    }

    PageInfoRepo::apply_edit(
        &mut *conn,
        page_id,
        &PageInfoEditUpdate {
            max_edit: plan.new_max_edit,
            current_edit: plan.is_live.then_some(plan.edit_num),
            undelete: plan.is_live && page.is_deleted,
            first_published_by: plan.is_first_publish().then(|| viewer.id.clone()),
            lock: plan
                .is_autosave
                .then(|| (viewer.id.clone(), page_locked_until(now))),
            release_lock: plan.is_live,
        },
    )
    .await?;

    let mut change_log_id = None;
    if let Some(log_type) = plan.change_log {
        let log = ChangeLogRepo::create(
            &mut *conn,
            &CreateChangeLog {
                page_id,
                edit: plan.edit_num,
                user_id: &viewer.id,
                log_type,
                aux_page_id: "",
            },
        )
        .await?;
        change_log_id = Some(log.id);
    }

    let comment_parents = if page.page_type == PageType::Comment && plan.is_live {
        comment_parents(&mut *conn, page_id).await?
    } else {
        Vec::new()
    };

    if plan.is_first_publish() {
        SubscriptionRepo::subscribe(&mut *conn, &viewer.id, page_id).await?;
        if let Some(parent) = comment_parents
            .iter()
            .find(|p| p.page_type == PageType::Comment)
        {
            SubscriptionRepo::subscribe(&mut *conn, &viewer.id, &parent.page_id).await?;
        }
    }

    Ok(WrittenEdit {
        change_log_id,
        comment_parents,
        related_change_logs,
    })
}

/// Pages whose text links to this one need their todo counts refreshed once
/// it becomes visible.
async fn linking_page_tasks(state: &AppState, info: &PageInfo) -> Vec<Task> {
    let mut spellings = vec![info.page_id.clone()];
    if info.alias != info.page_id {
        spellings.push(info.alias.to_lowercase());
    }

    let mut parents = BTreeSet::new();
    for alias in &spellings {
        match LinkRepo::list_linking_pages(&state.pool, alias).await {
            Ok(ids) => parents.extend(ids.into_iter().filter(|id| id != &info.page_id)),
            Err(e) => {
                tracing::error!(error = %e, page_id = %info.page_id, "Failed to list linking pages");
            }
        }
    }
    parents
        .into_iter()
        .map(|page_id| Task::UpdateMetadata(PageTask { page_id }))
        .collect()
}

/// Make an older edit live again.
pub async fn revert_page(
    state: &AppState,
    viewer: &Viewer,
    page_id: &str,
    edit_num: EditNum,
) -> AppResult<EditOutcome> {
    let info = PageInfoRepo::find_by_id(&state.pool, page_id)
        .await?
        .filter(|info| viewer.can_see_domain(&info.see_domain_id))
        .ok_or_else(|| CoreError::page_not_found(page_id))?;

    let target = PageRepo::find_edit(&state.pool, page_id, edit_num)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Edit",
            id: format!("{page_id}/{edit_num}"),
        })?;
    if target.is_autosave || target.is_snapshot {
        return Err(AppError::BadRequest(
            "Can only revert to a published edit".into(),
        ));
    }

    let submission = EditSubmission {
        page_id: page_id.to_string(),
        prev_edit: info.current_edit,
        current_edit: info.current_edit,
        content: target.content(),
        revert_to_edit: Some(edit_num),
        ..Default::default()
    };
    submit_edit(state, viewer, submission).await
}
