//! Abstract retrieval backend.
//!
//! The ranking pipeline treats the inverted-index service as a black box:
//! one operation taking a query, the searchable attributes, and paging
//! parameters, returning candidate documents plus an estimated total. The
//! concrete implementation speaks the Meilisearch-compatible HTTP contract.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::SearchError;
use crate::types::Document;

/// One retrieval against the external index.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub index: String,
    pub query: String,
    /// Attributes to search on for this strategy.
    pub attributes: Vec<String>,
    pub limit: usize,
    pub offset: usize,
    pub sort: Option<Vec<String>>,
    pub filters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalResponse {
    pub hits: Vec<Document>,
    pub estimated_total_hits: usize,
}

/// Black-box candidate retrieval. Implementations must be cancel-safe:
/// dropping the future abandons the request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, SearchError>;
}

/// HTTP client for a Meilisearch-compatible index service.
pub struct HttpSearchBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    hits: Vec<Document>,
    #[serde(default, rename = "estimatedTotalHits")]
    estimated_total_hits: usize,
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, SearchError> {
        let url = format!("{}/indexes/{}/search", self.base_url, request.index);

        let mut body = json!({
            "q": request.query,
            "limit": request.limit,
            "offset": request.offset,
            "attributesToSearchOn": request.attributes,
        });
        if let Some(sort) = &request.sort {
            body["sort"] = json!(sort);
        }
        if let Some(filters) = &request.filters {
            body["filter"] = json!(filters);
        }

        debug!(url = %url, query = %request.query, "retrieving candidates");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Backend(format!(
                "index service returned {status} for {url}"
            )));
        }

        let raw: RawSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Backend(format!("malformed index response: {e}")))?;

        Ok(RetrievalResponse {
            hits: raw.hits,
            estimated_total_hits: raw.estimated_total_hits,
        })
    }
}
