//! Folio background work: the durable task queue and everything it runs.
//!
//! - [`Task`]: closed set of task variants, stored as `(tag, payload)` rows.
//! - [`queue`]: validating enqueue helpers over `TaskRepo`.
//! - [`fanout`]: turns the effects of a committed edit into tasks.
//! - [`TaskRunner`]: lease/execute loop run by the worker binary.
//! - [`handlers`]: one module per task variant.
//! - [`search`]: external search index client.
//! - [`delivery`]: SMTP digest delivery.

pub mod config;
pub mod delivery;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod queue;
pub mod runner;
pub mod search;
pub mod tasks;

pub use config::WorkerConfig;
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use error::TaskError;
pub use runner::{TaskContext, TaskRunner};
pub use search::{SearchConfig, SearchIndex};
pub use tasks::{Task, TaskOutcome};
