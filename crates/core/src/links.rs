//! Alias/link resolution for page text.
//!
//! Page text references other pages through five markdown-like syntaxes.
//! Before an edit is stored, every alias reference is rewritten to the
//! referenced page's stable id, and the set of referenced ids/aliases is
//! recorded in the `links` table.
//!
//! The patterns are an approximation of markdown: four-space code blocks and
//! escaped brackets are not recognised. Tokens that resolve to nothing are
//! left exactly as written.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ids::is_id_valid;

/// Grammar of a single alias or id token.
pub const ALIAS_PATTERN: &str = r"[\-\+]?[A-Za-z0-9_]+\.?[A-Za-z0-9_]*";

/// Longest alias accepted when a page is created or renamed.
pub const MAX_ALIAS_LENGTH: usize = 64;

/// The link syntaxes recognised in page text, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkSyntax {
    /// `/p/alias` or `/pages/alias` inside a URL.
    UrlPath,
    /// `[alias]`, `[-alias]` or `[alias optional text]`.
    Bracket,
    /// `[text](alias)`.
    MarkdownLink,
    /// `[vote: alias]`.
    Vote,
    /// `[@alias]`.
    Mention,
}

impl LinkSyntax {
    pub const ALL: [LinkSyntax; 5] = [
        LinkSyntax::UrlPath,
        LinkSyntax::Bracket,
        LinkSyntax::MarkdownLink,
        LinkSyntax::Vote,
        LinkSyntax::Mention,
    ];

    /// Compiled pattern. Every pattern has an `alias` capture group.
    fn regex(self) -> &'static Regex {
        match self {
            LinkSyntax::UrlPath => &URL_PATH_RE,
            LinkSyntax::Bracket => &BRACKET_RE,
            LinkSyntax::MarkdownLink => &MARKDOWN_LINK_RE,
            LinkSyntax::Vote => &VOTE_RE,
            LinkSyntax::Mention => &MENTION_RE,
        }
    }

    /// Whether the text around a match allows it to count as a link.
    ///
    /// Neighbouring characters are checked here rather than consumed by the
    /// pattern, so adjacent links like `[a] [b]` all match.
    fn accepts(self, text: &str, start: usize, end: usize) -> bool {
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        match self {
            // `[[text]](alias)` must not match on its inner `[text]`; a
            // following `(`, `]` or backtick means markdown link, nesting or
            // inline code.
            LinkSyntax::Bracket => {
                before != Some('[') && !matches!(after, Some('(' | ']' | '`'))
            }
            LinkSyntax::Mention => !matches!(after, Some('(' | '`')),
            LinkSyntax::UrlPath | LinkSyntax::MarkdownLink | LinkSyntax::Vote => true,
        }
    }

    /// Matches of this syntax in `text` that pass the context guards.
    fn captures<'t>(self, text: &'t str) -> impl Iterator<Item = Captures<'t>> + 't {
        self.regex().captures_iter(text).filter(move |caps| {
            caps.get(0)
                .is_some_and(|m| self.accepts(text, m.start(), m.end()))
        })
    }
}

fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).expect("valid link regex")
}

static URL_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"/p(?:ages)?/(?P<alias>{ALIAS_PATTERN})")));

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"\[-?(?P<alias>{ALIAS_PATTERN})(?: [^\]]*?)?\]"))
});

static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"\[.+?\]\((?P<alias>{ALIAS_PATTERN})\)")));

static VOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"\[vote: ?(?P<alias>{ALIAS_PATTERN})\]")));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"\[@(?P<alias>{ALIAS_PATTERN})\]")));

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!("^{ALIAS_PATTERN}$")));

/// Lower-case-first and upper-case-first spellings of a token.
fn case_variants(token: &str) -> (String, String) {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str();
            (
                format!("{}{rest}", first.to_ascii_lowercase()),
                format!("{}{rest}", first.to_ascii_uppercase()),
            )
        }
        None => (String::new(), String::new()),
    }
}

/// Rewrites alias references to page ids and extracts the outgoing links of
/// a page.
///
/// Built once at startup; the URL-path extraction pattern is anchored on the
/// site's public address.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    site_url_re: Regex,
}

impl LinkResolver {
    pub fn new(site_address: &str) -> Result<Self, regex::Error> {
        let site = regex::escape(site_address.trim_end_matches('/'));
        let site_url_re = Regex::new(&format!(r"{site}/p(?:ages)?/(?P<alias>{ALIAS_PATTERN})"))?;
        Ok(Self { site_url_re })
    }

    /// Every alias spelling that needs a lookup before [`standardize`](Self::standardize).
    ///
    /// Each captured token is returned in both its lower-case-first and
    /// upper-case-first form, deduplicated, in first-seen order.
    pub fn alias_candidates(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for syntax in LinkSyntax::ALL {
            for caps in syntax.captures(text) {
                let (lower, upper) = case_variants(&caps["alias"]);
                for variant in [lower, upper] {
                    if seen.insert(variant.clone()) {
                        candidates.push(variant);
                    }
                }
            }
        }
        candidates
    }

    /// Rewrite every resolvable alias reference to its page id.
    ///
    /// `aliases` maps stored alias spellings to page ids, as loaded for the
    /// keys returned by [`alias_candidates`](Self::alias_candidates).
    pub fn standardize(&self, text: &str, aliases: &HashMap<String, String>) -> String {
        if aliases.is_empty() {
            return text.to_string();
        }

        let mut result = text.to_string();
        for syntax in LinkSyntax::ALL {
            let next = syntax
                .regex()
                .replace_all(&result, |caps: &Captures| {
                    rewrite_match(syntax, &result, caps, aliases)
                })
                .into_owned();
            result = next;
        }
        result
    }

    /// Outgoing links of a page: lower-cased, deduplicated, first-seen order.
    pub fn extract_links(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        let mut push = |token: &str| {
            let lower = token.to_lowercase();
            if seen.insert(lower.clone()) {
                links.push(lower);
            }
        };

        for caps in self.site_url_re.captures_iter(text) {
            push(&caps["alias"]);
        }
        for syntax in LinkSyntax::ALL {
            if syntax == LinkSyntax::UrlPath {
                continue;
            }
            for caps in syntax.captures(text) {
                push(&caps["alias"]);
            }
        }
        links
    }
}

fn rewrite_match(
    syntax: LinkSyntax,
    haystack: &str,
    caps: &Captures,
    aliases: &HashMap<String, String>,
) -> String {
    let whole = caps.get(0).expect("group 0 always participates");
    let alias = caps.name("alias").expect("alias group always participates");
    if !syntax.accepts(haystack, whole.start(), whole.end()) {
        return whole.as_str().to_string();
    }

    let (lower, upper) = case_variants(alias.as_str());
    let Some(page_id) = aliases.get(&lower).or_else(|| aliases.get(&upper)) else {
        return whole.as_str().to_string();
    };

    let start = alias.start() - whole.start();
    let end = alias.end() - whole.start();
    let text = whole.as_str();
    format!("{}{}{}", &text[..start], page_id, &text[end..])
}

/// User ids mentioned with `[@id]` in already-standardized text.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LinkSyntax::Mention
        .captures(text)
        .map(|caps| caps["alias"].to_string())
        .filter(|id| is_id_valid(id) && seen.insert(id.clone()))
        .collect()
}

/// An alias must match the token grammar, start with a letter (so it can
/// never be confused with an id) and stay reasonably short.
pub fn is_alias_valid(alias: &str) -> bool {
    alias.len() <= MAX_ALIAS_LENGTH
        && alias
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && ALIAS_RE.is_match(alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LinkResolver {
        LinkResolver::new("https://folio.example").unwrap()
    }

    fn alias_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(a, id)| (a.to_string(), id.to_string()))
            .collect()
    }

    #[test]
    fn rewrites_bracket_and_markdown_links() {
        let r = resolver();
        let text = "See [myAlias] and [[other]](otherAlias)";
        let map = alias_map(&[("myAlias", "5dg"), ("otherAlias", "4yf")]);

        let resolved = r.standardize(text, &map);
        assert_eq!(resolved, "See [5dg] and [[other]](4yf)");
        assert_eq!(r.extract_links(&resolved), vec!["5dg", "4yf"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = resolver();
        let map = alias_map(&[("myAlias", "5dg"), ("otherAlias", "4yf")]);
        let once = r.standardize("See [myAlias] and [[other]](otherAlias)", &map);
        let twice = r.standardize(&once, &map);
        assert_eq!(once, twice);
        assert_eq!(r.extract_links(&once), r.extract_links(&twice));
    }

    #[test]
    fn candidates_include_both_first_letter_cases() {
        let r = resolver();
        let candidates = r.alias_candidates("Read [Bayes_rule] first");
        assert_eq!(candidates, vec!["bayes_rule", "Bayes_rule"]);
    }

    #[test]
    fn lookup_tries_upper_case_first_letter() {
        let r = resolver();
        let map = alias_map(&[("Bayes", "1b")]);
        assert_eq!(r.standardize("[bayes rule text]", &map), "[1b rule text]");
    }

    #[test]
    fn unknown_alias_is_left_untouched() {
        let r = resolver();
        let map = alias_map(&[("known", "12")]);
        let text = "A [mystery] link and a [known] one";
        assert_eq!(r.standardize(text, &map), "A [mystery] link and a [12] one");
    }

    #[test]
    fn rewrites_vote_mention_and_url_syntaxes() {
        let r = resolver();
        let map = alias_map(&[("poll", "7c"), ("alice", "3f"), ("guide", "2b")]);
        let text = "[vote: poll] ping [@alice] see https://folio.example/p/guide";
        assert_eq!(
            r.standardize(text, &map),
            "[vote: 7c] ping [@3f] see https://folio.example/p/2b"
        );
    }

    #[test]
    fn adjacent_bracket_links_are_all_rewritten() {
        let r = resolver();
        let map = alias_map(&[("alpha", "1b"), ("beta", "2c")]);

        assert_eq!(r.standardize("[alpha] [beta]", &map), "[1b] [2c]");
        assert_eq!(r.standardize("[alpha]\n[beta]", &map), "[1b]\n[2c]");
        assert_eq!(r.standardize("[alpha][beta].", &map), "[1b][2c].");
        assert_eq!(r.extract_links("[1b] [2c]"), vec!["1b", "2c"]);
        assert_eq!(r.alias_candidates("[alpha] [beta]").len(), 4);
    }

    #[test]
    fn adjacent_mentions_are_all_found() {
        assert_eq!(extract_mentions("[@3f] [@4g]"), vec!["3f", "4g"]);
        assert_eq!(extract_mentions("[@3f][@4g]"), vec!["3f", "4g"]);
    }

    #[test]
    fn bracket_followed_by_backtick_is_not_rewritten() {
        let r = resolver();
        let map = alias_map(&[("code", "9z")]);
        assert_eq!(r.standardize("`[code]`", &map), "`[code]`");
    }

    #[test]
    fn preserves_dash_prefix_and_surrounding_case() {
        let r = resolver();
        let map = alias_map(&[("topic", "4c")]);
        assert_eq!(
            r.standardize("Intro: [-topic] DONE", &map),
            "Intro: [-4c] DONE"
        );
    }

    #[test]
    fn extract_links_lowercases_and_dedupes() {
        let r = resolver();
        let links = r.extract_links("[Alpha] and [alpha] and [text](Beta) and [vote: beta]");
        assert_eq!(links, vec!["alpha", "beta"]);
    }

    #[test]
    fn extract_links_only_counts_urls_on_this_site() {
        let r = resolver();
        let links =
            r.extract_links("https://folio.example/p/local and https://other.example/p/remote");
        assert_eq!(links, vec!["local"]);
    }

    #[test]
    fn mentions_only_return_ids() {
        assert_eq!(
            extract_mentions("hi [@3f] and [@someone] and [@3f] again"),
            vec!["3f"]
        );
    }

    #[test]
    fn alias_validity() {
        assert!(is_alias_valid("Bayes_rule"));
        assert!(is_alias_valid("intro.v2"));
        assert!(!is_alias_valid("5dg"));
        assert!(!is_alias_valid("has space"));
        assert!(!is_alias_valid(""));
        assert!(!is_alias_valid(&"a".repeat(MAX_ALIAS_LENGTH + 1)));
    }
}
