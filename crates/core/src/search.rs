//! Search documents and query helpers.
//!
//! Full-text search is served by an external index when one is configured
//! and by Postgres `tsquery` matching otherwise. Either way the hits are
//! re-filtered through the visibility rules before they are returned.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// What the search index stores for one live page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub page_id: String,
    pub alias: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub clickbait: String,
    pub text: String,
    pub see_domain_id: String,
    pub creator_id: String,
}

/// A page id returned by the index with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub page_id: String,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Split on whitespace and strip everything but alphanumerics and `_`.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Postgres `tsquery` matching every term, with prefix matching on the last
/// one so partially typed words still hit.
///
/// # Examples
///
/// ```
/// use folio_core::search::build_tsquery;
/// assert_eq!(build_tsquery("bayes ru"), Some("bayes & ru:*".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    let terms = sanitize_terms(query)?;
    let (last, exact) = terms.split_last()?;
    if exact.is_empty() {
        Some(format!("{last}:*"))
    } else {
        Some(format!("{} & {last}:*", exact.join(" & ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsquery_single_term_is_prefix() {
        assert_eq!(build_tsquery("bayes"), Some("bayes:*".to_string()));
    }

    #[test]
    fn tsquery_strips_punctuation() {
        assert_eq!(
            build_tsquery("bayes' rule!"),
            Some("bayes & rule:*".to_string())
        );
    }

    #[test]
    fn tsquery_empty_is_none() {
        assert_eq!(build_tsquery(""), None);
        assert_eq!(build_tsquery("?! ..."), None);
    }

    #[test]
    fn clamp_helpers() {
        assert_eq!(clamp_limit(None, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT), 20);
        assert_eq!(clamp_limit(Some(0), DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT), 1);
        assert_eq!(clamp_limit(Some(500), DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT), 100);
        assert_eq!(clamp_offset(Some(-3)), 0);
    }
}
