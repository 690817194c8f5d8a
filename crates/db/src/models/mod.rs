//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and, where rows are written from outside the repository, a
//! plain insert DTO.

pub mod change_log;
pub mod domain;
pub mod mark;
pub mod page;
pub mod pair;
pub mod task;
pub mod update;
pub mod user;
