//! Task variants and their wire form.
//!
//! A task is stored as a `tag` column plus a JSON `payload`; the pair is the
//! adjacently tagged serde encoding of [`Task`].

use std::time::Duration;

use folio_core::ids::is_id_valid;
use folio_core::types::DbId;
use folio_core::updates::UpdateType;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload", rename_all = "camelCase")]
pub enum Task {
    Tick(TickTask),
    NewUpdate(NewUpdateTask),
    AtMentionUpdate(AtMentionUpdateTask),
    PropagateDomain(PropagateDomainTask),
    UpdateSearchIndex(PageTask),
    RemoveFromSearchIndex(PageTask),
    UpdateMetadata(PageTask),
    EmailUpdates(EmailUpdatesTask),
}

/// Releases expired page locks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTask {}

/// Sends digest emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailUpdatesTask {}

/// Tasks that only need a page id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTask {
    pub page_id: String,
}

/// Notify every subscriber of `subscribed_to_id` except the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUpdateTask {
    /// The user whose action caused the update.
    pub user_id: String,
    pub update_type: UpdateType,
    #[serde(default)]
    pub group_by_page_id: String,
    #[serde(default)]
    pub group_by_user_id: String,
    pub subscribed_to_id: String,
    #[serde(default)]
    pub go_to_page_id: String,
    #[serde(default)]
    pub change_log_id: Option<DbId>,
    #[serde(default)]
    pub mark_id: Option<DbId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtMentionUpdateTask {
    pub user_id: String,
    pub mentioned_user_id: String,
    pub group_by_page_id: String,
    pub go_to_page_id: String,
}

/// Recompute the domains of a page and, if they changed, of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateDomainTask {
    pub page_id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// What the runner does with a task after executing it.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Remove the task from the queue.
    Done,
    /// Run the task again after the delay.
    RetryAfter(Duration),
    /// Leave the task for lease expiry.
    Failed(TaskError),
}

impl Task {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Tick(_) => "tick",
            Self::NewUpdate(_) => "newUpdate",
            Self::AtMentionUpdate(_) => "atMentionUpdate",
            Self::PropagateDomain(_) => "propagateDomain",
            Self::UpdateSearchIndex(_) => "updateSearchIndex",
            Self::RemoveFromSearchIndex(_) => "removeFromSearchIndex",
            Self::UpdateMetadata(_) => "updateMetadata",
            Self::EmailUpdates(_) => "emailUpdates",
        }
    }

    /// The JSON stored in the `payload` column.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Tick(t) => serde_json::to_value(t),
            Self::NewUpdate(t) => serde_json::to_value(t),
            Self::AtMentionUpdate(t) => serde_json::to_value(t),
            Self::PropagateDomain(t) => serde_json::to_value(t),
            Self::UpdateSearchIndex(t) => serde_json::to_value(t),
            Self::RemoveFromSearchIndex(t) => serde_json::to_value(t),
            Self::UpdateMetadata(t) => serde_json::to_value(t),
            Self::EmailUpdates(t) => serde_json::to_value(t),
        }
    }

    /// Rebuild a task from its stored columns. Unknown tags fail here.
    pub fn decode(tag: &str, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({ "tag": tag, "payload": payload }))
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        match self {
            Self::Tick(_) | Self::EmailUpdates(_) => Ok(()),
            Self::NewUpdate(t) => {
                require_id("userId", &t.user_id)?;
                require_id("subscribedToId", &t.subscribed_to_id)?;
                if t.group_by_page_id.is_empty() == t.group_by_user_id.is_empty() {
                    return Err(TaskError::Invalid(
                        "Exactly one of groupByPageId and groupByUserId must be set".to_string(),
                    ));
                }
                Ok(())
            }
            Self::AtMentionUpdate(t) => {
                require_id("userId", &t.user_id)?;
                require_id("mentionedUserId", &t.mentioned_user_id)?;
                require_id("groupByPageId", &t.group_by_page_id)?;
                require_id("goToPageId", &t.go_to_page_id)
            }
            Self::PropagateDomain(t) => require_id("pageId", &t.page_id),
            Self::UpdateSearchIndex(t)
            | Self::RemoveFromSearchIndex(t)
            | Self::UpdateMetadata(t) => require_id("pageId", &t.page_id),
        }
    }
}

fn require_id(field: &str, value: &str) -> Result<(), TaskError> {
    if is_id_valid(value) {
        Ok(())
    } else {
        Err(TaskError::Invalid(format!("Invalid {field}: '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn page_edit_update() -> NewUpdateTask {
        NewUpdateTask {
            user_id: "7".into(),
            update_type: UpdateType::PageEdit,
            group_by_page_id: "5dg".into(),
            group_by_user_id: String::new(),
            subscribed_to_id: "5dg".into(),
            go_to_page_id: "5dg".into(),
            change_log_id: Some(3),
            mark_id: None,
        }
    }

    #[test]
    fn stored_columns_decode_back() {
        let task = Task::NewUpdate(page_edit_update());
        let payload = task.payload().unwrap();
        assert_eq!(payload["updateType"], "pageEdit");
        assert_eq!(Task::decode(task.tag(), payload).unwrap(), task);
    }

    #[test]
    fn empty_payload_tasks_decode() {
        let tick = Task::decode("tick", serde_json::json!({})).unwrap();
        assert_eq!(tick, Task::Tick(TickTask {}));
        let email = Task::decode("emailUpdates", serde_json::json!({})).unwrap();
        assert_eq!(email.tag(), "emailUpdates");
    }

    #[test]
    fn unknown_tag_fails_to_decode() {
        assert!(Task::decode("fixText", serde_json::json!({"pageId": "5dg"})).is_err());
    }

    #[test]
    fn missing_required_field_fails_to_decode() {
        assert!(Task::decode("propagateDomain", serde_json::json!({})).is_err());
    }

    #[test]
    fn new_update_needs_one_group() {
        let mut task = page_edit_update();
        assert!(Task::NewUpdate(task.clone()).validate().is_ok());

        task.group_by_user_id = "7".into();
        assert_matches!(Task::NewUpdate(task.clone()).validate(), Err(TaskError::Invalid(_)));

        task.group_by_page_id.clear();
        task.group_by_user_id.clear();
        assert_matches!(Task::NewUpdate(task).validate(), Err(TaskError::Invalid(_)));
    }

    #[test]
    fn page_tasks_need_valid_ids() {
        let bad = Task::UpdateSearchIndex(PageTask { page_id: "0".into() });
        assert_matches!(bad.validate(), Err(TaskError::Invalid(msg)) if msg.contains("pageId"));
        let good = Task::PropagateDomain(PropagateDomainTask {
            page_id: "5dg".into(),
            deleted: true,
        });
        assert!(good.validate().is_ok());
    }
}
