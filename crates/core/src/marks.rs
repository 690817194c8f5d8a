//! Reader marks: questions, typo reports and confusion flags on page text.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::is_id_valid;
use crate::types::EditNum;

/// Delay before an auto-submitted mark notifies page subscribers, in seconds.
pub const MARK_AUTO_PROCESS_DELAY_SECS: u64 = 5 * 60;

pub const MAX_MARK_TEXT_LEN: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Query,
    Typo,
    Confusion,
}

impl MarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Typo => "typo",
            Self::Confusion => "confusion",
        }
    }

    /// Typo and confusion marks go straight to the page's subscribers.
    pub fn is_auto_submitted(&self) -> bool {
        matches!(self, Self::Typo | Self::Confusion)
    }
}

impl FromStr for MarkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "typo" => Ok(Self::Typo),
            "confusion" => Ok(Self::Confusion),
            other => Err(CoreError::Validation(format!("Invalid mark type: '{other}'"))),
        }
    }
}

/// Request body for creating a mark.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMark {
    pub page_id: String,
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default)]
    pub edit: EditNum,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub anchor_context: String,
    #[serde(default)]
    pub anchor_text: String,
    #[serde(default)]
    pub anchor_offset: i32,
}

impl NewMark {
    /// Check the request and return its parsed type.
    pub fn validate(&self) -> Result<MarkType, CoreError> {
        if !is_id_valid(&self.page_id) {
            return Err(CoreError::Validation("Invalid page id".to_string()));
        }
        let mark_type: MarkType = self.mark_type.parse()?;
        if mark_type != MarkType::Query && self.anchor_context.is_empty() {
            return Err(CoreError::Validation(
                "No anchor context is set".to_string(),
            ));
        }
        if self.text.len() > MAX_MARK_TEXT_LEN {
            return Err(CoreError::Validation(format!(
                "Mark text exceeds {MAX_MARK_TEXT_LEN} characters"
            )));
        }
        Ok(mark_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn mark(mark_type: &str, anchor_context: &str) -> NewMark {
        NewMark {
            page_id: "5dg".into(),
            mark_type: mark_type.into(),
            edit: 1,
            text: String::new(),
            anchor_context: anchor_context.into(),
            anchor_text: String::new(),
            anchor_offset: 0,
        }
    }

    #[test]
    fn query_needs_no_anchor() {
        assert_eq!(mark("query", "").validate().unwrap(), MarkType::Query);
    }

    #[test]
    fn typo_needs_anchor() {
        assert_matches!(mark("typo", "").validate(), Err(CoreError::Validation(_)));
        assert_eq!(mark("typo", "a sentance").validate().unwrap(), MarkType::Typo);
    }

    #[test]
    fn unknown_type_and_bad_page_rejected() {
        assert_matches!(mark("praise", "x").validate(), Err(CoreError::Validation(_)));
        let mut m = mark("query", "");
        m.page_id = "abc".into();
        assert_matches!(m.validate(), Err(CoreError::Validation(msg)) if msg == "Invalid page id");
    }

    #[test]
    fn auto_submit_rules() {
        assert!(!MarkType::Query.is_auto_submitted());
        assert!(MarkType::Typo.is_auto_submitted());
        assert!(MarkType::Confusion.is_auto_submitted());
    }
}
