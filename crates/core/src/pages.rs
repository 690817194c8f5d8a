//! Page-level enums, constants and permission rules.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Karma needed to edit a page once it has been published.
pub const EDIT_PAGE_KARMA_REQ: i32 = 200;

/// Karma needed to delete a page.
pub const DELETE_PAGE_KARMA_REQ: i32 = 200;

/// How long an autosave holds the page lock, in seconds.
pub const PAGE_LOCK_DURATION_SECS: i64 = 300;

/// Lock held by the creator of a brand-new page, in seconds.
pub const PAGE_QUICK_LOCK_DURATION_SECS: i64 = 60;

/// Domain every page belongs to unless it is restricted.
pub const UNIVERSAL_DOMAIN_ID: &str = "0";

pub fn page_locked_until(now: Timestamp) -> Timestamp {
    now + Duration::seconds(PAGE_LOCK_DURATION_SECS)
}

pub fn page_quick_locked_until(now: Timestamp) -> Timestamp {
    now + Duration::seconds(PAGE_QUICK_LOCK_DURATION_SECS)
}

// ---------------------------------------------------------------------------
// Page type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageType {
    Wiki,
    Lens,
    Question,
    Comment,
    Group,
    Domain,
}

impl PageType {
    pub const ALL: [PageType; 6] = [
        PageType::Wiki,
        PageType::Lens,
        PageType::Question,
        PageType::Comment,
        PageType::Group,
        PageType::Domain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wiki => "wiki",
            Self::Lens => "lens",
            Self::Question => "question",
            Self::Comment => "comment",
            Self::Group => "group",
            Self::Domain => "domain",
        }
    }
}

impl FromStr for PageType {
    type Err = CoreError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| CoreError::Validation(format!("Invalid page type: '{s}'")))
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pair type
// ---------------------------------------------------------------------------

/// Kind of relationship between two pages in `page_pairs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PairType {
    Parent,
    Tag,
    Requirement,
    Subject,
}

impl PairType {
    pub const ALL: [PairType; 4] = [
        PairType::Parent,
        PairType::Tag,
        PairType::Requirement,
        PairType::Subject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Tag => "tag",
            Self::Requirement => "requirement",
            Self::Subject => "subject",
        }
    }

    /// Change log written on the parent side when the relationship becomes
    /// visible.
    pub fn new_child_log(&self) -> ChangeLogType {
        match self {
            Self::Parent => ChangeLogType::NewChild,
            Self::Tag => ChangeLogType::NewUsedAsTag,
            Self::Requirement => ChangeLogType::NewRequiredBy,
            Self::Subject => ChangeLogType::NewTeacher,
        }
    }

    /// Change log written on the child side when the relationship becomes
    /// visible.
    pub fn new_parent_log(&self) -> ChangeLogType {
        match self {
            Self::Parent => ChangeLogType::NewParent,
            Self::Tag => ChangeLogType::NewTag,
            Self::Requirement => ChangeLogType::NewRequirement,
            Self::Subject => ChangeLogType::NewSubject,
        }
    }
}

impl FromStr for PairType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| CoreError::Validation(format!("Incorrect pair type: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Change log type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeLogType {
    NewEdit,
    RevertEdit,
    NewSnapshot,
    UndeletePage,
    DeletePage,
    NewAlias,
    NewParent,
    NewChild,
    NewTag,
    NewUsedAsTag,
    NewRequirement,
    NewRequiredBy,
    NewSubject,
    NewTeacher,
    DeleteParent,
    DeleteChild,
    DeleteTag,
    DeleteUsedAsTag,
    DeleteRequirement,
    DeleteRequiredBy,
    DeleteSubject,
    DeleteTeacher,
}

impl ChangeLogType {
    pub const ALL: [ChangeLogType; 22] = [
        ChangeLogType::NewEdit,
        ChangeLogType::RevertEdit,
        ChangeLogType::NewSnapshot,
        ChangeLogType::UndeletePage,
        ChangeLogType::DeletePage,
        ChangeLogType::NewAlias,
        ChangeLogType::NewParent,
        ChangeLogType::NewChild,
        ChangeLogType::NewTag,
        ChangeLogType::NewUsedAsTag,
        ChangeLogType::NewRequirement,
        ChangeLogType::NewRequiredBy,
        ChangeLogType::NewSubject,
        ChangeLogType::NewTeacher,
        ChangeLogType::DeleteParent,
        ChangeLogType::DeleteChild,
        ChangeLogType::DeleteTag,
        ChangeLogType::DeleteUsedAsTag,
        ChangeLogType::DeleteRequirement,
        ChangeLogType::DeleteRequiredBy,
        ChangeLogType::DeleteSubject,
        ChangeLogType::DeleteTeacher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewEdit => "newEdit",
            Self::RevertEdit => "revertEdit",
            Self::NewSnapshot => "newSnapshot",
            Self::UndeletePage => "undeletePage",
            Self::DeletePage => "deletePage",
            Self::NewAlias => "newAlias",
            Self::NewParent => "newParent",
            Self::NewChild => "newChild",
            Self::NewTag => "newTag",
            Self::NewUsedAsTag => "newUsedAsTag",
            Self::NewRequirement => "newRequirement",
            Self::NewRequiredBy => "newRequiredBy",
            Self::NewSubject => "newSubject",
            Self::NewTeacher => "newTeacher",
            Self::DeleteParent => "deleteParent",
            Self::DeleteChild => "deleteChild",
            Self::DeleteTag => "deleteTag",
            Self::DeleteUsedAsTag => "deleteUsedAsTag",
            Self::DeleteRequirement => "deleteRequirement",
            Self::DeleteRequiredBy => "deleteRequiredBy",
            Self::DeleteSubject => "deleteSubject",
            Self::DeleteTeacher => "deleteTeacher",
        }
    }
}

impl FromStr for ChangeLogType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown change log type: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Domain role
// ---------------------------------------------------------------------------

/// Membership role in a domain, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainRole {
    Banned,
    Default,
    Trusted,
    Editor,
    Admin,
}

impl DomainRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Banned => "banned",
            Self::Default => "default",
            Self::Trusted => "trusted",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for DomainRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "banned" => Ok(Self::Banned),
            "" | "default" => Ok(Self::Default),
            "trusted" => Ok(Self::Trusted),
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            other => Err(CoreError::Validation(format!("Unknown domain role: '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Outcome of an edit or delete permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Allowed,
    /// Only allowed because the user is a site admin.
    AllowedAsAdmin,
    Denied { required_karma: i32 },
}

impl AccessLevel {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied { .. })
    }

    /// Turn a denial into a `Forbidden` error naming the karma requirement.
    pub fn require(self, action: &str) -> Result<(), CoreError> {
        match self {
            Self::Denied { required_karma } => Err(CoreError::Forbidden(format!(
                "Can't {action}: need at least {required_karma} karma"
            ))),
            _ => Ok(()),
        }
    }
}

fn access_for(required_karma: i32, karma: i32, is_admin: bool) -> AccessLevel {
    if karma >= required_karma {
        AccessLevel::Allowed
    } else if is_admin {
        AccessLevel::AllowedAsAdmin
    } else {
        AccessLevel::Denied { required_karma }
    }
}

/// Published pages always need [`EDIT_PAGE_KARMA_REQ`]; the page's own lock
/// can only raise the bar.
pub fn edit_access(edit_karma_lock: i32, was_published: bool, karma: i32, is_admin: bool) -> AccessLevel {
    let mut required = edit_karma_lock;
    if was_published && required < EDIT_PAGE_KARMA_REQ {
        required = EDIT_PAGE_KARMA_REQ;
    }
    access_for(required, karma, is_admin)
}

pub fn delete_access(edit_karma_lock: i32, karma: i32, is_admin: bool) -> AccessLevel {
    access_for(edit_karma_lock.max(DELETE_PAGE_KARMA_REQ), karma, is_admin)
}
