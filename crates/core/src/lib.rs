//! Folio domain logic.
//!
//! Everything in this crate is pure: no database, no network. The storage
//! and HTTP layers call into it so the rules (id allocation, link
//! resolution, edit planning, visibility, update grouping) can be tested
//! without a running Postgres.

pub mod editing;
pub mod error;
pub mod ids;
pub mod links;
pub mod marks;
pub mod pages;
pub mod query;
pub mod search;
pub mod text;
pub mod types;
pub mod updates;
pub mod visibility;
