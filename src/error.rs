use thiserror::Error;

/// Error kinds surfaced by the search pipeline.
///
/// Retrieval and enrichment failures fail the whole request: scoring over a
/// partial fan-out or returning unannotated hits would be silently wrong.
/// Recoverable conditions (bad `dep` values, empty queries, missing phonetic
/// data) are handled inline and never reach this type.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The external index backend could not be reached or returned an error.
    #[error("index backend request failed: {0}")]
    Backend(String),

    /// The enrichment store failed while annotating hits.
    #[error("enrichment lookup failed: {0}")]
    Enrichment(String),

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
