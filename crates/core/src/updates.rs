//! Notification ("update") types and read-time grouping.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateType {
    TopLevelComment,
    Reply,
    ChangeLog,
    PageEdit,
    CommentEdit,
    UndeletePage,
    NewPageByUser,
    AtMention,
    NewMark,
    ResolvedMark,
    AnsweredMark,
}

impl UpdateType {
    pub const ALL: [UpdateType; 11] = [
        UpdateType::TopLevelComment,
        UpdateType::Reply,
        UpdateType::ChangeLog,
        UpdateType::PageEdit,
        UpdateType::CommentEdit,
        UpdateType::UndeletePage,
        UpdateType::NewPageByUser,
        UpdateType::AtMention,
        UpdateType::NewMark,
        UpdateType::ResolvedMark,
        UpdateType::AnsweredMark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLevelComment => "topLevelComment",
            Self::Reply => "reply",
            Self::ChangeLog => "changeLog",
            Self::PageEdit => "pageEdit",
            Self::CommentEdit => "commentEdit",
            Self::UndeletePage => "undeletePage",
            Self::NewPageByUser => "newPageByUser",
            Self::AtMention => "atMention",
            Self::NewMark => "newMark",
            Self::ResolvedMark => "resolvedMark",
            Self::AnsweredMark => "answeredMark",
        }
    }

    /// Types still shown after the page they point to was deleted.
    pub fn okay_when_go_to_page_deleted(&self) -> bool {
        matches!(self, Self::ChangeLog | Self::PageEdit)
    }
}

impl FromStr for UpdateType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown update type: '{s}'")))
    }
}

/// One stored update row joined with liveness of the pages it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRow {
    pub id: DbId,
    pub user_id: String,
    pub by_user_id: String,
    pub update_type: UpdateType,
    pub group_by_page_id: String,
    pub group_by_user_id: String,
    pub subscribed_to_id: String,
    pub go_to_page_id: String,
    pub mark_id: Option<DbId>,
    pub change_log_id: Option<DbId>,
    pub seen: bool,
    pub is_group_by_object_alive: bool,
    pub is_go_to_page_alive: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupKey {
    pub group_by_page_id: String,
    pub group_by_user_id: String,
    pub seen: bool,
    pub is_group_by_object_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry {
    pub id: DbId,
    /// Cleared for mark updates so the mark author stays anonymous.
    pub by_user_id: String,
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    pub repeated: u32,
    pub subscribed_to_id: String,
    pub go_to_page_id: String,
    pub is_go_to_page_alive: bool,
    pub mark_id: Option<DbId>,
    pub change_log_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    pub key: UpdateGroupKey,
    pub most_recent_date: Timestamp,
    pub updates: Vec<UpdateEntry>,
}

/// Group rows for display, preserving the order groups are first seen in.
///
/// Repeated `pageEdit` updates by the same author on the same subscription
/// collapse into one entry with a repeat counter. Rows whose go-to page is
/// gone are dropped unless their type is allowed to outlive it.
pub fn group_updates(rows: &[UpdateRow]) -> Vec<UpdateGroup> {
    let mut groups: Vec<UpdateGroup> = Vec::new();
    let mut index_by_key: HashMap<UpdateGroupKey, usize> = HashMap::new();

    for row in rows {
        if !row.is_go_to_page_alive && !row.update_type.okay_when_go_to_page_deleted() {
            continue;
        }

        let key = UpdateGroupKey {
            group_by_page_id: row.group_by_page_id.clone(),
            group_by_user_id: row.group_by_user_id.clone(),
            seen: row.seen,
            is_group_by_object_alive: row.is_group_by_object_alive,
        };

        let index = *index_by_key.entry(key.clone()).or_insert_with(|| {
            groups.push(UpdateGroup {
                key,
                most_recent_date: row.created_at,
                updates: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[index];
        if group.most_recent_date < row.created_at {
            group.most_recent_date = row.created_at;
        }

        if row.update_type == UpdateType::PageEdit {
            if let Some(existing) = group.updates.iter_mut().find(|e| {
                e.update_type == row.update_type
                    && e.subscribed_to_id == row.subscribed_to_id
                    && e.by_user_id == row.by_user_id
            }) {
                existing.repeated += 1;
                continue;
            }
        }

        group.updates.push(UpdateEntry {
            id: row.id,
            by_user_id: if row.mark_id.is_some() {
                String::new()
            } else {
                row.by_user_id.clone()
            },
            update_type: row.update_type,
            repeated: 1,
            subscribed_to_id: row.subscribed_to_id.clone(),
            go_to_page_id: row.go_to_page_id.clone(),
            is_go_to_page_alive: row.is_go_to_page_alive,
            mark_id: row.mark_id,
            change_log_id: row.change_log_id,
            created_at: row.created_at,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(id: DbId, update_type: UpdateType, by: &str, page: &str) -> UpdateRow {
        UpdateRow {
            id,
            user_id: "2".into(),
            by_user_id: by.into(),
            update_type,
            group_by_page_id: page.into(),
            group_by_user_id: String::new(),
            subscribed_to_id: page.into(),
            go_to_page_id: page.into(),
            mark_id: None,
            change_log_id: None,
            seen: false,
            is_group_by_object_alive: true,
            is_go_to_page_alive: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
        }
    }

    #[test]
    fn repeated_page_edits_collapse() {
        let rows = vec![
            row(1, UpdateType::PageEdit, "7", "5dg"),
            row(2, UpdateType::PageEdit, "7", "5dg"),
            row(3, UpdateType::PageEdit, "8", "5dg"),
        ];
        let groups = group_updates(&rows);
        assert_eq!(groups.len(), 1);
        let updates = &groups[0].updates;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].repeated, 2);
        assert_eq!(updates[1].repeated, 1);
        assert_eq!(groups[0].most_recent_date, rows[2].created_at);
    }

    #[test]
    fn other_types_never_collapse() {
        let rows = vec![
            row(1, UpdateType::Reply, "7", "5dg"),
            row(2, UpdateType::Reply, "7", "5dg"),
        ];
        assert_eq!(group_updates(&rows)[0].updates.len(), 2);
    }

    #[test]
    fn groups_split_on_seen_flag() {
        let mut seen = row(2, UpdateType::Reply, "7", "5dg");
        seen.seen = true;
        let groups = group_updates(&[row(1, UpdateType::Reply, "7", "5dg"), seen]);
        assert_eq!(groups.len(), 2);
        assert!(!groups[0].key.seen);
        assert!(groups[1].key.seen);
    }

    #[test]
    fn deleted_go_to_page_hides_most_types() {
        let mut reply = row(1, UpdateType::Reply, "7", "5dg");
        reply.is_go_to_page_alive = false;
        let mut edit = row(2, UpdateType::PageEdit, "7", "5dg");
        edit.is_go_to_page_alive = false;

        let groups = group_updates(&[reply, edit]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].updates.len(), 1);
        assert_eq!(groups[0].updates[0].update_type, UpdateType::PageEdit);
    }

    #[test]
    fn mark_updates_hide_author() {
        let mut mark = row(1, UpdateType::NewMark, "7", "5dg");
        mark.mark_id = Some(44);
        let groups = group_updates(&[mark]);
        assert_eq!(groups[0].updates[0].by_user_id, "");
    }

    #[test]
    fn update_type_tags_round_trip() {
        for t in UpdateType::ALL {
            assert_eq!(t.as_str().parse::<UpdateType>().unwrap(), t);
        }
        assert!(UpdateType::ChangeLog.okay_when_go_to_page_deleted());
        assert!(!UpdateType::Reply.okay_when_go_to_page_deleted());
    }
}
