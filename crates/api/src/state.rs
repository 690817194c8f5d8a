use std::sync::Arc;

use folio_core::links::LinkResolver;
use folio_events::SearchIndex;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc` or is already a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: folio_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Alias and link extraction for the configured site address.
    pub resolver: Arc<LinkResolver>,
    /// External full-text index; a disabled index falls back to Postgres.
    pub search: Arc<dyn SearchIndex>,
}
