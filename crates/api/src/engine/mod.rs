//! Page write paths shared by the HTTP handlers.
//!
//! - [`editing`] -- submit and revert edits.
//! - [`lifecycle`] -- create, abandon and delete pages.

pub mod editing;
pub mod lifecycle;

pub use editing::{revert_page, submit_edit, EditOutcome};
pub use lifecycle::{abandon_page, delete_page, new_page, NewPageOutcome, NewPageRequest};
