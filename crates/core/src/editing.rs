//! Edit planning: everything about a submitted edit that can be decided
//! without touching storage.
//!
//! The API layer loads a [`CurrentPage`], calls [`prepare_edit`], resolves
//! links in the planned text, checks [`EditPlan::is_noop`] and then writes
//! the plan inside one transaction.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pages::{edit_access, ChangeLogType, PageType};
use crate::text::normalize_line_endings;
use crate::types::{EditNum, Timestamp};
use crate::visibility::Viewer;

// ---------------------------------------------------------------------------
// Page state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// No edit rows at all.
    NeverPublished,
    /// Autosaves or snapshots exist but nothing was ever live.
    DraftOnly,
    PublishedLive,
    PublishedDeleted,
}

impl PageState {
    /// A page with no live edit is a draft whatever its deleted flag says;
    /// only a page that once had a live edit can be undeleted.
    pub fn of(current_edit: EditNum, max_edit: EditNum, is_deleted: bool) -> Self {
        if current_edit <= 0 {
            if max_edit > 0 {
                PageState::DraftOnly
            } else {
                PageState::NeverPublished
            }
        } else if is_deleted {
            PageState::PublishedDeleted
        } else {
            PageState::PublishedLive
        }
    }

    pub fn was_published(&self) -> bool {
        matches!(self, PageState::PublishedLive | PageState::PublishedDeleted)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The user-editable content of one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditContent {
    pub title: String,
    pub clickbait: String,
    pub text: String,
    pub meta_text: String,
    pub anchor_context: String,
    pub anchor_text: String,
    pub anchor_offset: i32,
}

/// An edit as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSubmission {
    pub page_id: String,
    #[serde(default)]
    pub prev_edit: EditNum,
    /// The edit the client believes is live.
    #[serde(default)]
    pub current_edit: EditNum,
    #[serde(flatten)]
    pub content: EditContent,
    #[serde(default)]
    pub is_autosave: bool,
    #[serde(default)]
    pub is_snapshot: bool,
    #[serde(default)]
    pub snapshot_text: String,
    #[serde(default)]
    pub is_minor_edit: bool,
    #[serde(default)]
    pub is_editor_comment: bool,
    /// Set only by the revert operation, never accepted from clients.
    #[serde(skip)]
    pub revert_to_edit: Option<EditNum>,
}

/// Authoritative state of the page being edited, loaded by the caller.
#[derive(Debug, Clone)]
pub struct CurrentPage {
    pub page_id: String,
    pub page_type: PageType,
    pub current_edit: EditNum,
    pub max_edit: EditNum,
    pub is_deleted: bool,
    pub edit_karma_lock: i32,
    /// Content of the live edit, if there is one.
    pub live: Option<EditContent>,
    /// Highest autosave edit number owned by the submitting user.
    pub own_autosave_edit: Option<EditNum>,
    /// Live title of a lens page's parent.
    pub lens_parent_title: Option<String>,
}

impl CurrentPage {
    pub fn state(&self) -> PageState {
        PageState::of(self.current_edit, self.max_edit, self.is_deleted)
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What the engine should write for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    pub page_id: String,
    pub state: PageState,
    pub edit_num: EditNum,
    pub prev_edit: EditNum,
    pub content: EditContent,
    pub is_live: bool,
    pub is_autosave: bool,
    pub is_snapshot: bool,
    pub snapshot_text: String,
    pub is_minor_edit: bool,
    pub is_editor_comment: bool,
    /// Present when the client's view was stale; carries the live edit number.
    pub obsolete_edit: Option<EditNum>,
    /// Log entry to append, if any.
    pub change_log: Option<ChangeLogType>,
    /// `max_edit` after this edit.
    pub new_max_edit: EditNum,
}

impl EditPlan {
    /// First time the page goes live.
    pub fn is_first_publish(&self) -> bool {
        self.is_live && !self.state.was_published()
    }

    /// Going live from never-published or deleted.
    pub fn is_becoming_visible(&self) -> bool {
        self.is_live
            && matches!(
                self.state,
                PageState::NeverPublished | PageState::DraftOnly | PageState::PublishedDeleted
            )
    }

    pub fn is_undelete(&self) -> bool {
        self.is_live && self.state == PageState::PublishedDeleted
    }

    /// A live edit of a live page that changes nothing visible.
    ///
    /// Must be called after link standardization so the text compares like
    /// for like with the stored live edit.
    pub fn is_noop(&self, page: &CurrentPage) -> bool {
        if !self.is_live || self.state != PageState::PublishedLive {
            return false;
        }
        page.live.as_ref().is_some_and(|live| *live == self.content)
    }
}

/// Text stored on a snapshot created because the client's edit was stale.
pub fn conflict_snapshot_text(now: Timestamp) -> String {
    format!(
        "Automatically saved snapshot ({})",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Meta text is either empty or a JSON object.
pub fn parse_meta_text(meta_text: &str) -> Result<Option<serde_json::Value>, CoreError> {
    if meta_text.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(meta_text)
        .map_err(|e| CoreError::Validation(format!("Couldn't parse meta text: {e}")))?;
    if !value.is_object() {
        return Err(CoreError::Validation(
            "Meta text must be a JSON object".to_string(),
        ));
    }
    Ok(Some(value))
}

/// Decide edit number, liveness, change log and validate a submission.
///
/// Link standardization and the no-op check happen afterwards in the caller,
/// because they need an alias lookup.
pub fn prepare_edit(
    page: &CurrentPage,
    mut submission: EditSubmission,
    viewer: &Viewer,
    now: Timestamp,
) -> Result<EditPlan, CoreError> {
    let state = page.state();

    // Optimistic concurrency: somebody published since the client loaded.
    let mut obsolete_edit = None;
    if state.was_published() && submission.current_edit != page.current_edit {
        obsolete_edit = Some(page.current_edit);
        submission.is_autosave = false;
        submission.is_snapshot = true;
        submission.snapshot_text = conflict_snapshot_text(now);
    }

    let is_live = !submission.is_autosave && !submission.is_snapshot;

    let edit_num = if state == PageState::PublishedDeleted && is_live {
        submission.current_edit
    } else if let Some(target) = submission.revert_to_edit.filter(|n| is_live && *n > 0) {
        target
    } else if let Some(own) = page
        .own_autosave_edit
        .filter(|n| *n > page.current_edit)
    {
        own
    } else {
        page.max_edit + 1
    };

    // -- Validation ------------------------------------------------------

    edit_access(
        page.edit_karma_lock,
        state.was_published(),
        viewer.karma,
        viewer.is_admin,
    )
    .require("edit")?;

    if submission.is_autosave && submission.is_snapshot {
        return Err(CoreError::Validation(
            "Can't set autosave and snapshot".to_string(),
        ));
    }
    if edit_num <= 0 {
        return Err(CoreError::Validation(format!(
            "Invalid edit number {edit_num}"
        )));
    }

    let content = &mut submission.content;
    if is_live {
        if content.title.is_empty() && page.page_type != PageType::Comment {
            return Err(CoreError::Validation("Need title".to_string()));
        }
        if content.text.is_empty() && page.page_type != PageType::Question {
            return Err(CoreError::Validation("Need text".to_string()));
        }
    }
    if !submission.is_autosave {
        if content.anchor_context.is_empty() && !content.anchor_text.is_empty() {
            return Err(CoreError::Validation("Anchor context isn't set".to_string()));
        }
        if !content.anchor_context.is_empty() && content.anchor_text.is_empty() {
            return Err(CoreError::Validation("Anchor text isn't set".to_string()));
        }
        let context_len = i32::try_from(content.anchor_context.len()).unwrap_or(i32::MAX);
        if content.anchor_offset < 0 || content.anchor_offset > context_len {
            return Err(CoreError::Validation(
                "Anchor offset out of bounds".to_string(),
            ));
        }
    }
    if is_live {
        parse_meta_text(&content.meta_text)?;
    }

    // -- Normalization ---------------------------------------------------

    content.text = normalize_line_endings(&content.text);
    content.meta_text = normalize_line_endings(&content.meta_text);
    if !submission.is_snapshot {
        submission.snapshot_text.clear();
    }

    if page.page_type == PageType::Lens && is_live && !state.was_published() {
        if content.title.contains(':') {
            return Err(CoreError::Validation(
                "Lens title can't include \":\" character".to_string(),
            ));
        }
        if let Some(parent_title) = &page.lens_parent_title {
            content.title = format!("{parent_title}: {}", content.title);
        }
    }

    let change_log = if is_live && state == PageState::PublishedDeleted {
        Some(ChangeLogType::UndeletePage)
    } else if is_live && submission.revert_to_edit.is_some() {
        Some(ChangeLogType::RevertEdit)
    } else if submission.is_snapshot {
        Some(ChangeLogType::NewSnapshot)
    } else if is_live {
        Some(ChangeLogType::NewEdit)
    } else {
        None
    };

    Ok(EditPlan {
        page_id: submission.page_id,
        state,
        edit_num,
        prev_edit: submission.prev_edit,
        content: submission.content,
        is_live,
        is_autosave: submission.is_autosave,
        is_snapshot: submission.is_snapshot,
        snapshot_text: submission.snapshot_text,
        is_minor_edit: submission.is_minor_edit,
        is_editor_comment: submission.is_editor_comment,
        obsolete_edit,
        change_log,
        new_max_edit: page.max_edit.max(edit_num),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::EDIT_PAGE_KARMA_REQ;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn editor() -> Viewer {
        Viewer {
            id: "12".into(),
            karma: EDIT_PAGE_KARMA_REQ,
            is_admin: false,
            domain_roles: HashMap::new(),
        }
    }

    fn content(title: &str, text: &str) -> EditContent {
        EditContent {
            title: title.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    fn live_page(current_edit: EditNum) -> CurrentPage {
        CurrentPage {
            page_id: "5dg".into(),
            page_type: PageType::Wiki,
            current_edit,
            max_edit: current_edit,
            is_deleted: false,
            edit_karma_lock: 0,
            live: Some(content("Title", "Body")),
            own_autosave_edit: None,
            lens_parent_title: None,
        }
    }

    fn draft_page() -> CurrentPage {
        CurrentPage {
            current_edit: 0,
            max_edit: 1,
            live: None,
            own_autosave_edit: Some(1),
            ..live_page(0)
        }
    }

    fn submit(current_edit: EditNum, c: EditContent) -> EditSubmission {
        EditSubmission {
            page_id: "5dg".into(),
            current_edit,
            content: c,
            ..Default::default()
        }
    }

    // -- state ------------------------------------------------------------

    #[test]
    fn page_state_classification() {
        assert_eq!(PageState::of(0, 0, false), PageState::NeverPublished);
        assert_eq!(PageState::of(0, 2, false), PageState::DraftOnly);
        assert_eq!(PageState::of(3, 3, false), PageState::PublishedLive);
        assert_eq!(PageState::of(3, 3, true), PageState::PublishedDeleted);
        assert_eq!(PageState::of(0, 1, true), PageState::DraftOnly);
        assert_eq!(PageState::of(0, 0, true), PageState::NeverPublished);
    }

    #[test]
    fn autosave_older_than_live_edit_is_not_reused() {
        let page = CurrentPage {
            own_autosave_edit: Some(2),
            ..live_page(3)
        };
        let plan = prepare_edit(&page, submit(3, content("T", "newer")), &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 4);
        assert!(plan.is_live);
        assert_eq!(plan.new_max_edit, 4);
    }

    #[test]
    fn deleted_draft_publishes_as_first_edit() {
        let page = CurrentPage {
            is_deleted: true,
            ..draft_page()
        };
        let plan = prepare_edit(&page, submit(0, content("T", "B")), &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 1);
        assert!(plan.is_live);
        assert!(plan.is_first_publish());
        assert!(!plan.is_undelete());
        assert_eq!(plan.change_log, Some(ChangeLogType::NewEdit));
    }

    // -- edit number -------------------------------------------------------

    #[test]
    fn first_publish_reuses_own_autosave_number() {
        let plan = prepare_edit(&draft_page(), submit(0, content("T", "B")), &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 1);
        assert!(plan.is_live);
        assert!(plan.is_first_publish());
        assert_eq!(plan.change_log, Some(ChangeLogType::NewEdit));
    }

    #[test]
    fn new_edit_gets_max_plus_one() {
        let plan = prepare_edit(&live_page(3), submit(3, content("T", "New")), &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 4);
        assert_eq!(plan.new_max_edit, 4);
        assert!(plan.obsolete_edit.is_none());
    }

    #[test]
    fn revert_uses_target_edit() {
        let mut sub = submit(3, content("Old", "Old body"));
        sub.revert_to_edit = Some(2);
        let plan = prepare_edit(&live_page(3), sub, &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 2);
        assert_eq!(plan.new_max_edit, 3);
        assert_eq!(plan.change_log, Some(ChangeLogType::RevertEdit));
    }

    #[test]
    fn undelete_republishes_callers_current_edit() {
        let page = CurrentPage {
            is_deleted: true,
            ..live_page(3)
        };
        let plan = prepare_edit(&page, submit(3, content("T", "B")), &editor(), now()).unwrap();
        assert_eq!(plan.edit_num, 3);
        assert!(plan.is_undelete());
        assert!(plan.is_becoming_visible());
        assert_eq!(plan.change_log, Some(ChangeLogType::UndeletePage));
    }

    // -- conflicts -------------------------------------------------------

    #[test]
    fn stale_current_edit_becomes_snapshot() {
        let plan = prepare_edit(&live_page(2), submit(1, content("Mine", "Mine")), &editor(), now()).unwrap();
        assert_eq!(plan.obsolete_edit, Some(2));
        assert!(plan.is_snapshot);
        assert!(!plan.is_live);
        assert_eq!(plan.edit_num, 3);
        assert_eq!(plan.snapshot_text, "Automatically saved snapshot (2024-03-01T12:00:00Z)");
        assert_eq!(plan.change_log, Some(ChangeLogType::NewSnapshot));
    }

    // -- validation ------------------------------------------------------

    #[test]
    fn autosave_and_snapshot_together_rejected() {
        let mut sub = submit(0, content("T", "B"));
        sub.is_autosave = true;
        sub.is_snapshot = true;
        assert_matches!(
            prepare_edit(&draft_page(), sub, &editor(), now()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn live_edit_needs_title_unless_comment() {
        assert_matches!(
            prepare_edit(&draft_page(), submit(0, content("", "B")), &editor(), now()),
            Err(CoreError::Validation(msg)) if msg == "Need title"
        );
        let comment = CurrentPage {
            page_type: PageType::Comment,
            ..draft_page()
        };
        assert!(prepare_edit(&comment, submit(0, content("", "B")), &editor(), now()).is_ok());
    }

    #[test]
    fn live_edit_needs_text_unless_question() {
        assert_matches!(
            prepare_edit(&draft_page(), submit(0, content("T", "")), &editor(), now()),
            Err(CoreError::Validation(msg)) if msg == "Need text"
        );
        let question = CurrentPage {
            page_type: PageType::Question,
            ..draft_page()
        };
        assert!(prepare_edit(&question, submit(0, content("T", "")), &editor(), now()).is_ok());
    }

    #[test]
    fn autosave_skips_content_checks() {
        let mut sub = submit(0, content("", ""));
        sub.is_autosave = true;
        sub.content.anchor_text = "dangling".into();
        let plan = prepare_edit(&draft_page(), sub, &editor(), now()).unwrap();
        assert!(!plan.is_live);
        assert_eq!(plan.change_log, None);
    }

    #[test]
    fn anchor_fields_must_be_consistent() {
        let mut sub = submit(0, content("T", "B"));
        sub.content.anchor_context = "some context".into();
        assert_matches!(
            prepare_edit(&draft_page(), sub.clone(), &editor(), now()),
            Err(CoreError::Validation(_))
        );
        sub.content.anchor_text = "context".into();
        sub.content.anchor_offset = 99;
        assert_matches!(
            prepare_edit(&draft_page(), sub.clone(), &editor(), now()),
            Err(CoreError::Validation(msg)) if msg.contains("offset")
        );
        sub.content.anchor_offset = 5;
        assert!(prepare_edit(&draft_page(), sub, &editor(), now()).is_ok());
    }

    #[test]
    fn live_meta_text_must_be_json_object() {
        let mut sub = submit(0, content("T", "B"));
        sub.content.meta_text = "not json".into();
        assert_matches!(
            prepare_edit(&draft_page(), sub.clone(), &editor(), now()),
            Err(CoreError::Validation(_))
        );
        sub.content.meta_text = "{\"hasVote\": true}".into();
        assert!(prepare_edit(&draft_page(), sub, &editor(), now()).is_ok());
    }

    #[test]
    fn low_karma_cannot_edit_published_page() {
        let viewer = Viewer {
            karma: 5,
            ..editor()
        };
        assert_matches!(
            prepare_edit(&live_page(1), submit(1, content("T", "B2")), &viewer, now()),
            Err(CoreError::Forbidden(_))
        );
    }

    // -- normalization ---------------------------------------------------

    #[test]
    fn crlf_is_normalized() {
        let plan =
            prepare_edit(&draft_page(), submit(0, content("T", "a\r\nb")), &editor(), now()).unwrap();
        assert_eq!(plan.content.text, "a\nb");
    }

    #[test]
    fn lens_title_gets_parent_prefix_on_first_publish() {
        let lens = CurrentPage {
            page_type: PageType::Lens,
            lens_parent_title: Some("Bayes' rule".into()),
            ..draft_page()
        };
        let plan = prepare_edit(&lens, submit(0, content("Guide", "B")), &editor(), now()).unwrap();
        assert_eq!(plan.content.title, "Bayes' rule: Guide");

        assert_matches!(
            prepare_edit(&lens, submit(0, content("Bad: title", "B")), &editor(), now()),
            Err(CoreError::Validation(_))
        );
    }

    // -- no-op -----------------------------------------------------------

    #[test]
    fn identical_live_edit_is_noop() {
        let page = live_page(1);
        let plan = prepare_edit(&page, submit(1, content("Title", "Body")), &editor(), now()).unwrap();
        assert!(plan.is_noop(&page));

        let changed = prepare_edit(&page, submit(1, content("Title", "Body!")), &editor(), now()).unwrap();
        assert!(!changed.is_noop(&page));
    }

    #[test]
    fn undelete_with_same_content_is_not_noop() {
        let page = CurrentPage {
            is_deleted: true,
            ..live_page(1)
        };
        let plan = prepare_edit(&page, submit(1, content("Title", "Body")), &editor(), now()).unwrap();
        assert!(!plan.is_noop(&page));
    }

    #[test]
    fn meta_text_parsing() {
        assert_eq!(parse_meta_text("").unwrap(), None);
        assert!(parse_meta_text("{}").unwrap().is_some());
        assert!(parse_meta_text("[1]").is_err());
    }
}
