//! Metadata derived from page text: named summaries and the todo count.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Name given to the unnamed summary and to the first-line fallback.
pub const DEFAULT_SUMMARY_NAME: &str = "Summary";

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^\[summary(\([^)]+\))?: ?([\s\S]+?)\] *(\z|\n\z|\n\n)")
        .expect("valid regex")
});

static FIRST_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)").expect("valid regex"));

static TODO_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[todo: ?[^\]]*\]").expect("valid regex"));

static TODO_BAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|+?todo: ?[^|]*\|+").expect("valid regex"));

static RED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ [^\]]+\]").expect("valid regex"));

/// Convert Windows line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Named summaries declared in the text.
///
/// `[summary: ...]` declares the default summary and `[summary(name): ...]`
/// a named one; each must start a line and be followed by a blank line or
/// the end of the text. When no default summary is declared, the first line
/// of the text stands in for it.
pub fn extract_summaries(text: &str) -> BTreeMap<String, String> {
    let mut summaries = BTreeMap::new();

    for caps in SUMMARY_RE.captures_iter(text) {
        let name = caps
            .get(1)
            .map(|m| m.as_str().trim_matches(|c| c == '(' || c == ')'))
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SUMMARY_NAME);
        summaries.insert(name.to_string(), caps[2].trim().to_string());
    }

    if !summaries.contains_key(DEFAULT_SUMMARY_NAME) {
        let first_line = FIRST_LINE_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        summaries.insert(DEFAULT_SUMMARY_NAME.to_string(), first_line.to_string());
    }

    summaries
}

/// Number of open todos: `[todo: ...]`, `|todo: ...|` (any number of bars)
/// and red links written as `[ text]`.
pub fn extract_todo_count(text: &str) -> i32 {
    let count = TODO_BRACKET_RE.find_iter(text).count()
        + TODO_BAR_RE.find_iter(text).count()
        + RED_LINK_RE.find_iter(text).count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- summaries -------------------------------------------------------

    #[test]
    fn first_line_is_default_summary() {
        let summaries = extract_summaries("Bayes' rule relates odds.\n\nMore text here.");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[DEFAULT_SUMMARY_NAME], "Bayes' rule relates odds.");
    }

    #[test]
    fn explicit_and_named_summaries() {
        let text = "[summary: Short version.]\n\n[summary(Technical): Long\nversion.]\n\nBody";
        let summaries = extract_summaries(text);
        assert_eq!(summaries[DEFAULT_SUMMARY_NAME], "Short version.");
        assert_eq!(summaries["Technical"], "Long\nversion.");
    }

    #[test]
    fn named_summary_still_gets_first_line_default() {
        let summaries = extract_summaries("[summary(Brief): Just this.]");
        assert_eq!(summaries["Brief"], "Just this.");
        assert_eq!(summaries[DEFAULT_SUMMARY_NAME], "[summary(Brief): Just this.]");
    }

    #[test]
    fn summary_not_at_line_start_is_ignored() {
        let summaries = extract_summaries("Intro [summary: nope]\n\nrest");
        assert_eq!(summaries[DEFAULT_SUMMARY_NAME], "Intro [summary: nope]");
    }

    #[test]
    fn empty_text_has_empty_default_summary() {
        assert_eq!(extract_summaries("")[DEFAULT_SUMMARY_NAME], "");
    }

    // -- todo count ------------------------------------------------------

    #[test]
    fn counts_all_todo_forms() {
        let text = "[todo: fix] and |todo: cite| and ||todo: more|| and [ missing page]";
        assert_eq!(extract_todo_count(text), 4);
    }

    #[test]
    fn ordinary_links_are_not_todos() {
        assert_eq!(extract_todo_count("[alias] and [text](alias)"), 0);
    }

    // -- line endings ----------------------------------------------------

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(normalize_line_endings("a\r\nb\r\n"), "a\nb\n");
    }
}
