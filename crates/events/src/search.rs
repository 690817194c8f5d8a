//! External full-text search index.
//!
//! [`HttpSearchIndex`] talks to an Elasticsearch-style document API. When
//! `SEARCH_URL` is not set the [`DisabledSearchIndex`] is used instead and
//! search falls back to Postgres.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::search::{SearchDocument, SearchHit};
use serde::Deserialize;

const DEFAULT_SEARCH_INDEX: &str = "pages";
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search index returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Search index is not configured")]
    Disabled,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Whether queries can be served. Writes to a disabled index are no-ops.
    fn is_enabled(&self) -> bool;

    async fn upsert(&self, document: &SearchDocument) -> Result<(), SearchError>;

    /// Remove a page. Removing a page that is not indexed succeeds.
    async fn remove(&self, page_id: &str) -> Result<(), SearchError>;

    /// Best matches for `query`, highest score first.
    async fn query(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>, SearchError>;
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub index: String,
    pub timeout: Duration,
}

impl SearchConfig {
    /// Returns `None` if `SEARCH_URL` is not set.
    ///
    /// | Variable              | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `SEARCH_URL`          | yes      |         |
    /// | `SEARCH_INDEX`        | no       | `pages` |
    /// | `SEARCH_TIMEOUT_SECS` | no       | `5`     |
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SEARCH_URL").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index: std::env::var("SEARCH_INDEX")
                .unwrap_or_else(|_| DEFAULT_SEARCH_INDEX.to_string()),
            timeout: Duration::from_secs(
                std::env::var("SEARCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            ),
        })
    }
}

/// Build the index client for an optional configuration.
pub fn build_search_index(
    config: Option<SearchConfig>,
) -> Result<Arc<dyn SearchIndex>, SearchError> {
    match config {
        Some(config) => Ok(Arc::new(HttpSearchIndex::new(config)?)),
        None => Ok(Arc::new(DisabledSearchIndex)),
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpSearchIndex {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitList,
}

#[derive(Debug, Deserialize)]
struct HitList {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
}

impl HttpSearchIndex {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn document_url(&self, page_id: &str) -> String {
        format!("{}/{}/_doc/{page_id}", self.config.base_url, self.config.index)
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn upsert(&self, document: &SearchDocument) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.document_url(&document.page_id))
            .json(document)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn remove(&self, page_id: &str) -> Result<(), SearchError> {
        let response = self.client.delete(self.document_url(page_id)).send().await?;
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(SearchError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn query(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>, SearchError> {
        let body = serde_json::json!({
            "size": limit,
            "_source": false,
            "query": {
                "multi_match": {
                    "query": query,
                    "fields": ["title^3", "alias^3", "clickbait^2", "text"],
                    "type": "best_fields",
                    "fuzziness": "AUTO",
                }
            }
        });
        let response = self
            .client
            .post(format!("{}/{}/_search", self.config.base_url, self.config.index))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::HttpStatus(response.status().as_u16()));
        }
        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|h| SearchHit {
                page_id: h.id,
                score: h.score.unwrap_or(0.0),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Disabled implementation
// ---------------------------------------------------------------------------

pub struct DisabledSearchIndex;

#[async_trait]
impl SearchIndex for DisabledSearchIndex {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn upsert(&self, _document: &SearchDocument) -> Result<(), SearchError> {
        Ok(())
    }

    async fn remove(&self, _page_id: &str) -> Result<(), SearchError> {
        Ok(())
    }

    async fn query(&self, _query: &str, _limit: i64) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::Disabled)
    }
}
