//! Turning committed writes into background tasks.
//!
//! Planning is pure ([`plan_edit_tasks`], [`plan_delete_tasks`],
//! [`plan_mark_task`]) so the notification rules are unit-testable; the
//! enqueue helpers run after the write transaction commits and only log
//! failures.

use std::time::Duration;

use folio_core::marks::MARK_AUTO_PROCESS_DELAY_SECS;
use folio_core::pages::PageType;
use folio_core::types::DbId;
use folio_core::updates::UpdateType;
use folio_db::DbPool;

use crate::queue;
use crate::tasks::{AtMentionUpdateTask, NewUpdateTask, PageTask, PropagateDomainTask, Task};

/// A live parent of a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentParent {
    pub page_id: String,
    pub page_type: PageType,
}

/// A change log written on another page because a relationship with the
/// edited page became visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedChangeLog {
    pub page_id: String,
    pub change_log_id: DbId,
}

/// What a committed edit did, as far as notifications are concerned.
#[derive(Debug, Clone)]
pub struct EditEffects {
    pub page_id: String,
    pub page_type: PageType,
    pub author_id: String,
    pub is_live: bool,
    pub is_minor_edit: bool,
    pub is_first_publish: bool,
    pub is_undelete: bool,
    pub change_log_id: Option<DbId>,
    pub comment_parents: Vec<CommentParent>,
    /// User ids mentioned in the new text.
    pub mentions: Vec<String>,
    pub related_change_logs: Vec<RelatedChangeLog>,
}

fn update(
    effects: &EditEffects,
    update_type: UpdateType,
    subscribed_to_id: &str,
    group_by_page_id: &str,
) -> Task {
    Task::NewUpdate(NewUpdateTask {
        user_id: effects.author_id.clone(),
        update_type,
        group_by_page_id: group_by_page_id.to_string(),
        group_by_user_id: String::new(),
        subscribed_to_id: subscribed_to_id.to_string(),
        go_to_page_id: effects.page_id.clone(),
        change_log_id: effects.change_log_id,
        mark_id: None,
    })
}

/// Tasks to enqueue after an edit commits. Autosaves and snapshots produce
/// none.
pub fn plan_edit_tasks(effects: &EditEffects) -> Vec<Task> {
    if !effects.is_live {
        return Vec::new();
    }

    let page_id = effects.page_id.as_str();
    let mut tasks = vec![Task::UpdateSearchIndex(PageTask {
        page_id: page_id.to_string(),
    })];

    if effects.is_first_publish || effects.is_undelete {
        tasks.push(Task::PropagateDomain(PropagateDomainTask {
            page_id: page_id.to_string(),
            deleted: false,
        }));
    }

    // Comments group under the page they discuss.
    let parent_comment = effects
        .comment_parents
        .iter()
        .find(|p| p.page_type == PageType::Comment);
    let group_page = if effects.page_type == PageType::Comment {
        effects
            .comment_parents
            .iter()
            .find(|p| p.page_type != PageType::Comment)
            .or(parent_comment)
            .map(|p| p.page_id.as_str())
    } else {
        Some(page_id)
    };

    if !effects.is_minor_edit {
        if effects.page_type == PageType::Comment {
            if let Some(group) = group_page {
                let task = match (effects.is_first_publish, parent_comment) {
                    (true, Some(parent)) => {
                        update(effects, UpdateType::Reply, &parent.page_id, group)
                    }
                    (true, None) => update(effects, UpdateType::TopLevelComment, group, group),
                    (false, _) => update(effects, UpdateType::CommentEdit, group, group),
                };
                tasks.push(task);
            }
        } else if effects.is_first_publish {
            tasks.push(Task::NewUpdate(NewUpdateTask {
                user_id: effects.author_id.clone(),
                update_type: UpdateType::NewPageByUser,
                group_by_page_id: String::new(),
                group_by_user_id: effects.author_id.clone(),
                subscribed_to_id: effects.author_id.clone(),
                go_to_page_id: page_id.to_string(),
                change_log_id: None,
                mark_id: None,
            }));
        } else if effects.is_undelete {
            tasks.push(update(effects, UpdateType::UndeletePage, page_id, page_id));
        } else {
            tasks.push(update(effects, UpdateType::PageEdit, page_id, page_id));
        }
    }

    if let Some(group) = group_page {
        let mut seen: Vec<&str> = Vec::new();
        for mentioned in &effects.mentions {
            if mentioned == &effects.author_id || seen.contains(&mentioned.as_str()) {
                continue;
            }
            seen.push(mentioned);
            tasks.push(Task::AtMentionUpdate(AtMentionUpdateTask {
                user_id: effects.author_id.clone(),
                mentioned_user_id: mentioned.clone(),
                group_by_page_id: group.to_string(),
                go_to_page_id: page_id.to_string(),
            }));
        }
    }

    for related in &effects.related_change_logs {
        tasks.push(Task::NewUpdate(NewUpdateTask {
            user_id: effects.author_id.clone(),
            update_type: UpdateType::ChangeLog,
            group_by_page_id: related.page_id.clone(),
            group_by_user_id: String::new(),
            subscribed_to_id: related.page_id.clone(),
            go_to_page_id: related.page_id.clone(),
            change_log_id: Some(related.change_log_id),
            mark_id: None,
        }));
    }

    tasks
}

/// Tasks to enqueue after a page is deleted.
pub fn plan_delete_tasks(page_id: &str) -> Vec<Task> {
    vec![
        Task::RemoveFromSearchIndex(PageTask {
            page_id: page_id.to_string(),
        }),
        Task::PropagateDomain(PropagateDomainTask {
            page_id: page_id.to_string(),
            deleted: true,
        }),
    ]
}

/// The delayed `newMark` notification for an auto-submitted mark.
pub fn plan_mark_task(page_id: &str, creator_id: &str, mark_id: DbId) -> (Task, Duration) {
    let task = Task::NewUpdate(NewUpdateTask {
        user_id: creator_id.to_string(),
        update_type: UpdateType::NewMark,
        group_by_page_id: page_id.to_string(),
        group_by_user_id: String::new(),
        subscribed_to_id: page_id.to_string(),
        go_to_page_id: page_id.to_string(),
        change_log_id: None,
        mark_id: Some(mark_id),
    });
    (task, Duration::from_secs(MARK_AUTO_PROCESS_DELAY_SECS))
}

/// Enqueue every task now, logging and skipping failures.
pub async fn enqueue_all(pool: &DbPool, tasks: &[Task]) {
    for task in tasks {
        enqueue_best_effort(pool, task, Duration::ZERO).await;
    }
}

/// Enqueue one task, logging instead of returning a failure.
pub async fn enqueue_best_effort(pool: &DbPool, task: &Task, delay: Duration) {
    if let Err(e) = queue::enqueue(pool, task, delay).await {
        tracing::error!(tag = task.tag(), error = %e, "Failed to enqueue task");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effects(page_type: PageType) -> EditEffects {
        EditEffects {
            page_id: "5dg".into(),
            page_type,
            author_id: "7".into(),
            is_live: true,
            is_minor_edit: false,
            is_first_publish: false,
            is_undelete: false,
            change_log_id: Some(11),
            comment_parents: Vec::new(),
            mentions: Vec::new(),
            related_change_logs: Vec::new(),
        }
    }

    fn update_types(tasks: &[Task]) -> Vec<UpdateType> {
        tasks
            .iter()
            .filter_map(|t| match t {
                Task::NewUpdate(u) => Some(u.update_type),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn autosave_plans_nothing() {
        let mut e = effects(PageType::Wiki);
        e.is_live = false;
        assert!(plan_edit_tasks(&e).is_empty());
    }

    #[test]
    fn plain_edit_indexes_and_notifies() {
        let tasks = plan_edit_tasks(&effects(PageType::Wiki));
        assert_eq!(tasks[0].tag(), "updateSearchIndex");
        assert_eq!(update_types(&tasks), vec![UpdateType::PageEdit]);
        assert!(!tasks.iter().any(|t| t.tag() == "propagateDomain"));
        match &tasks[1] {
            Task::NewUpdate(u) => assert_eq!(u.change_log_id, Some(11)),
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn minor_edit_skips_subscriber_update() {
        let mut e = effects(PageType::Wiki);
        e.is_minor_edit = true;
        assert!(update_types(&plan_edit_tasks(&e)).is_empty());
    }

    #[test]
    fn first_publish_notifies_user_subscribers_and_propagates() {
        let mut e = effects(PageType::Wiki);
        e.is_first_publish = true;
        let tasks = plan_edit_tasks(&e);
        assert!(tasks.iter().any(|t| t.tag() == "propagateDomain"));
        let update = tasks
            .iter()
            .find_map(|t| match t {
                Task::NewUpdate(u) => Some(u),
                _ => None,
            })
            .unwrap();
        assert_eq!(update.update_type, UpdateType::NewPageByUser);
        assert_eq!(update.group_by_user_id, "7");
        assert!(Task::NewUpdate(update.clone()).validate().is_ok());
    }

    #[test]
    fn undelete_notifies_page_subscribers() {
        let mut e = effects(PageType::Wiki);
        e.is_undelete = true;
        let tasks = plan_edit_tasks(&e);
        assert_eq!(update_types(&tasks), vec![UpdateType::UndeletePage]);
        assert!(tasks.iter().any(|t| t.tag() == "propagateDomain"));
    }

    #[test]
    fn new_comment_kinds() {
        let page = CommentParent {
            page_id: "4yf".into(),
            page_type: PageType::Wiki,
        };
        let parent_comment = CommentParent {
            page_id: "6bb".into(),
            page_type: PageType::Comment,
        };

        let mut top = effects(PageType::Comment);
        top.is_first_publish = true;
        top.comment_parents = vec![page.clone()];
        assert_eq!(update_types(&plan_edit_tasks(&top)), vec![UpdateType::TopLevelComment]);

        let mut reply = top.clone();
        reply.comment_parents = vec![page, parent_comment];
        let tasks = plan_edit_tasks(&reply);
        match tasks.iter().find(|t| t.tag() == "newUpdate") {
            Some(Task::NewUpdate(u)) => {
                assert_eq!(u.update_type, UpdateType::Reply);
                assert_eq!(u.subscribed_to_id, "6bb");
                assert_eq!(u.group_by_page_id, "4yf");
            }
            other => panic!("unexpected task {other:?}"),
        }

        let mut edit = reply.clone();
        edit.is_first_publish = false;
        assert_eq!(update_types(&plan_edit_tasks(&edit)), vec![UpdateType::CommentEdit]);
    }

    #[test]
    fn mentions_skip_author_and_duplicates() {
        let mut e = effects(PageType::Wiki);
        e.is_minor_edit = true;
        e.mentions = vec!["7".into(), "9".into(), "9".into(), "12".into()];
        let mentioned: Vec<String> = plan_edit_tasks(&e)
            .into_iter()
            .filter_map(|t| match t {
                Task::AtMentionUpdate(m) => Some(m.mentioned_user_id),
                _ => None,
            })
            .collect();
        assert_eq!(mentioned, vec!["9".to_string(), "12".to_string()]);
    }

    #[test]
    fn related_change_logs_notify_related_page() {
        let mut e = effects(PageType::Wiki);
        e.is_minor_edit = true;
        e.related_change_logs = vec![RelatedChangeLog {
            page_id: "4yf".into(),
            change_log_id: 21,
        }];
        let tasks = plan_edit_tasks(&e);
        match tasks.last() {
            Some(Task::NewUpdate(u)) => {
                assert_eq!(u.update_type, UpdateType::ChangeLog);
                assert_eq!(u.subscribed_to_id, "4yf");
                assert_eq!(u.change_log_id, Some(21));
            }
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn delete_and_mark_plans() {
        let tags: Vec<&str> = plan_delete_tasks("5dg").iter().map(Task::tag).collect();
        assert_eq!(tags, vec!["removeFromSearchIndex", "propagateDomain"]);

        let (task, delay) = plan_mark_task("5dg", "7", 4);
        assert_eq!(delay, Duration::from_secs(300));
        assert!(task.validate().is_ok());
    }
}
