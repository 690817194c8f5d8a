//! Recompute which domains a page belongs to.
//!
//! A page belongs to its own domain if it is a domain page, and to every
//! domain of each published parent that lives in the universal see-domain.
//! When a page's set changes its children are re-processed, so propagation
//! stops at the first page whose set is already correct.

use std::collections::BTreeSet;
use std::time::Duration;

use folio_core::pages::{PairType, UNIVERSAL_DOMAIN_ID};
use folio_db::models::domain::DomainSource;
use folio_db::repositories::{DomainRepo, PairRepo};

use crate::error::TaskError;
use crate::fanout;
use crate::runner::TaskContext;
use crate::tasks::{PropagateDomainTask, Task, TaskOutcome};

/// Changes needed to bring a page's domain set in line with its sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl DomainDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

pub fn diff_domains(current: &[String], sources: &[DomainSource]) -> DomainDiff {
    let should_have: BTreeSet<&str> = sources
        .iter()
        .filter(|s| s.see_domain_id == UNIVERSAL_DOMAIN_ID)
        .map(|s| s.domain_id.as_str())
        .collect();
    let has: BTreeSet<&str> = current.iter().map(String::as_str).collect();

    DomainDiff {
        to_add: should_have.difference(&has).map(|d| d.to_string()).collect(),
        to_remove: has.difference(&should_have).map(|d| d.to_string()).collect(),
    }
}

pub async fn run(
    ctx: &TaskContext,
    task: &PropagateDomainTask,
) -> Result<TaskOutcome, TaskError> {
    let page_id = task.page_id.as_str();
    let children = if task.deleted {
        remove_deleted_page(ctx, page_id).await?
    } else {
        let current = DomainRepo::list_page_domains(&ctx.pool, page_id).await?;
        let sources = DomainRepo::list_domain_sources(&ctx.pool, page_id).await?;
        let diff = diff_domains(&current, &sources);
        if diff.is_empty() {
            return Ok(TaskOutcome::Done);
        }

        let mut tx = ctx.pool.begin().await?;
        DomainRepo::add_page_domains(&mut *tx, page_id, &diff.to_add).await?;
        DomainRepo::remove_page_domains(&mut *tx, page_id, &diff.to_remove).await?;
        tx.commit().await?;
        tracing::info!(
            page_id,
            added = ?diff.to_add,
            removed = ?diff.to_remove,
            "Page domains changed"
        );

        PairRepo::list_child_ids(&ctx.pool, page_id, &[PairType::Parent]).await?
    };

    for child_id in children {
        let task = Task::PropagateDomain(PropagateDomainTask {
            page_id: child_id,
            deleted: false,
        });
        fanout::enqueue_best_effort(&ctx.pool, &task, Duration::ZERO).await;
    }
    Ok(TaskOutcome::Done)
}

/// Drop every relationship and domain of a deleted page, returning its
/// former children.
async fn remove_deleted_page(
    ctx: &TaskContext,
    page_id: &str,
) -> Result<Vec<String>, TaskError> {
    let mut tx = ctx.pool.begin().await?;
    let removed = PairRepo::delete_for_page(&mut *tx, page_id).await?;
    let current = DomainRepo::list_page_domains(&mut *tx, page_id).await?;
    DomainRepo::remove_page_domains(&mut *tx, page_id, &current).await?;
    tx.commit().await?;

    tracing::info!(page_id, pairs = removed.len(), "Relationships of deleted page removed");

    Ok(removed
        .into_iter()
        .filter(|p| p.parent_id == page_id && p.pair_type == PairType::Parent.as_str())
        .map(|p| p.child_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(domain_id: &str, see_domain_id: &str) -> DomainSource {
        DomainSource {
            domain_id: domain_id.into(),
            see_domain_id: see_domain_id.into(),
        }
    }

    #[test]
    fn adds_missing_and_removes_stale() {
        let current = vec!["3".to_string(), "8".to_string()];
        let sources = vec![source("3", "0"), source("5", "0")];
        let diff = diff_domains(&current, &sources);
        assert_eq!(diff.to_add, vec!["5".to_string()]);
        assert_eq!(diff.to_remove, vec!["8".to_string()]);
    }

    #[test]
    fn private_parents_do_not_propagate() {
        let diff = diff_domains(&[], &[source("5", "7")]);
        assert!(diff.is_empty());
    }

    #[test]
    fn duplicate_sources_collapse() {
        let diff = diff_domains(&[], &[source("5", "0"), source("5", "0")]);
        assert_eq!(diff.to_add, vec!["5".to_string()]);
    }

    #[test]
    fn matching_set_is_empty_diff() {
        let diff = diff_domains(&["5".to_string()], &[source("5", "0")]);
        assert!(diff.is_empty());
    }
}
