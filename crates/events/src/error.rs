use folio_core::error::CoreError;

use crate::delivery::email::EmailError;
use crate::search::SearchError;

/// Failure while validating, enqueueing or executing a task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Invalid task: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Search index error: {0}")]
    Search(#[from] SearchError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Task timed out after {0:?}")]
    Timeout(std::time::Duration),
}
