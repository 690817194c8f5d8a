//! Page visibility rules expressed as SQL predicates over `page_infos`.

use std::collections::HashMap;

use crate::pages::{DomainRole, UNIVERSAL_DOMAIN_ID};
use crate::query::QueryPart;

/// The user a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// Empty for anonymous readers.
    pub id: String,
    pub karma: i32,
    pub is_admin: bool,
    /// Domain id -> membership role.
    pub domain_roles: HashMap<String, DomainRole>,
}

impl Viewer {
    /// A reader who is not logged in: sees only the universal domain.
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            karma: 0,
            is_admin: false,
            domain_roles: HashMap::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty()
    }

    pub fn can_see_domain(&self, domain_id: &str) -> bool {
        domain_id == UNIVERSAL_DOMAIN_ID
            || self
                .domain_roles
                .get(domain_id)
                .is_some_and(|role| *role != DomainRole::Banned)
    }

    /// The universal domain plus every domain the viewer may see, sorted.
    pub fn visible_domain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .domain_roles
            .keys()
            .filter(|id| id.as_str() != UNIVERSAL_DOMAIN_ID && self.can_see_domain(id))
            .cloned()
            .collect();
        ids.sort();
        ids.insert(0, UNIVERSAL_DOMAIN_ID.to_string());
        ids
    }
}

/// Options for [`PageInfoFilter::to_query`].
///
/// Without a viewer the domain check is skipped entirely; this is reserved
/// for system-internal scans (tasks, maintenance). HTTP handlers always pass
/// a viewer, using [`Viewer::anonymous`] for logged-out readers.
#[derive(Debug, Clone)]
pub struct PageInfoFilter<'a> {
    pub viewer: Option<&'a Viewer>,
    pub include_unpublished: bool,
    pub include_deleted: bool,
    pub extra: Option<QueryPart>,
    /// Column prefix, e.g. `"pi."`; empty to reference columns bare.
    pub table_prefix: &'a str,
}

impl<'a> PageInfoFilter<'a> {
    /// Published, non-deleted pages visible to `viewer`.
    pub fn for_viewer(viewer: &'a Viewer) -> Self {
        Self {
            viewer: Some(viewer),
            include_unpublished: false,
            include_deleted: false,
            extra: None,
            table_prefix: "pi.",
        }
    }

    /// Every page regardless of domain or state.
    pub fn system_all() -> Self {
        Self {
            viewer: None,
            include_unpublished: true,
            include_deleted: true,
            extra: None,
            table_prefix: "pi.",
        }
    }

    pub fn with_prefix(mut self, prefix: &'a str) -> Self {
        self.table_prefix = prefix;
        self
    }

    pub fn with_unpublished(mut self) -> Self {
        self.include_unpublished = true;
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn with_extra(mut self, extra: QueryPart) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn to_query(&self) -> QueryPart {
        let p = self.table_prefix;
        let mut clauses: Vec<QueryPart> = Vec::new();

        if let Some(viewer) = self.viewer {
            clauses.push(
                QueryPart::new(format!("{p}see_domain_id = ANY(?)"))
                    .arg(viewer.visible_domain_ids()),
            );
        }
        if !self.include_unpublished {
            clauses.push(QueryPart::new(format!("{p}current_edit > 0")));
        }
        if !self.include_deleted {
            clauses.push(QueryPart::new(format!("NOT {p}is_deleted")));
        }
        if let Some(extra) = &self.extra {
            clauses.push(extra.clone());
        }

        clauses
            .into_iter()
            .reduce(QueryPart::and)
            .unwrap_or_else(QueryPart::always_true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryArg;

    fn member_of(domains: &[(&str, DomainRole)]) -> Viewer {
        Viewer {
            id: "12".into(),
            karma: 0,
            is_admin: false,
            domain_roles: domains
                .iter()
                .map(|(id, role)| (id.to_string(), *role))
                .collect(),
        }
    }

    #[test]
    fn anonymous_sees_only_universal_domain() {
        let viewer = Viewer::anonymous();
        assert!(viewer.can_see_domain("0"));
        assert!(!viewer.can_see_domain("5"));

        let query = PageInfoFilter::for_viewer(&viewer).to_query();
        assert_eq!(
            query.sql(),
            "((pi.see_domain_id = ANY(?)) AND (pi.current_edit > 0)) AND (NOT pi.is_deleted)"
        );
        assert_eq!(query.args(), &[QueryArg::TextList(vec!["0".into()])]);
    }

    #[test]
    fn member_sees_their_domain_but_banned_does_not() {
        let viewer = member_of(&[("5", DomainRole::Default), ("7", DomainRole::Banned)]);
        assert!(viewer.can_see_domain("5"));
        assert!(!viewer.can_see_domain("7"));
        assert_eq!(viewer.visible_domain_ids(), vec!["0", "5"]);
    }

    #[test]
    fn system_scan_with_everything_widened_is_true() {
        let query = PageInfoFilter::system_all().to_query();
        assert_eq!(query.sql(), "TRUE");
        assert!(query.args().is_empty());
    }

    #[test]
    fn extra_predicate_is_conjoined_with_prefix() {
        let viewer = Viewer::anonymous();
        let query = PageInfoFilter::for_viewer(&viewer)
            .with_prefix("")
            .with_deleted()
            .with_extra(QueryPart::new("page_id = ?").arg("5dg"))
            .to_query();
        assert_eq!(
            query.sql(),
            "((see_domain_id = ANY(?)) AND (current_edit > 0)) AND (page_id = ?)"
        );
        assert_eq!(query.args().len(), 2);
    }
}
