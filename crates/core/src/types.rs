/// Surrogate keys (change logs, updates, marks, tasks) are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Stable base-31 identifier shared by pages and users.
pub type PageId = String;

/// Numeric edit counter within a page.
pub type EditNum = i32;
