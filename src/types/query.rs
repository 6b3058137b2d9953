use serde::{Deserialize, Serialize};

/// Preprocessed query forms, supplied by the caller.
///
/// Preprocessing (cleaning, soundex generation, tokenization) happens
/// upstream; the ranking pipeline consumes the result as-is. The `words*`
/// sequences are the whitespace-split tokenizations of their text forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryData {
    pub original: String,
    /// Lowercased, diacritics removed.
    pub cleaned: String,
    /// `cleaned` with all whitespace removed.
    pub no_space: String,
    /// Space-separated phonetic tokens; empty when unavailable.
    pub soundex: String,
    #[serde(default)]
    pub original_length: usize,
    #[serde(default)]
    pub cleaned_length: usize,
    #[serde(default)]
    pub no_space_length: usize,
    #[serde(rename = "wordsCleaned")]
    pub words_cleaned: Vec<String>,
    #[serde(rename = "wordsOriginal")]
    pub words_original: Vec<String>,
    #[serde(rename = "wordsNoSpace")]
    pub words_no_space: Vec<String>,
}

/// Query input accepted on the wire: a structured [`QueryData`] object or a
/// raw string (which skips the scoring pipeline entirely).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
    Structured(Box<QueryData>),
    Text(String),
}

fn default_limit() -> usize {
    200
}

fn default_per_page() -> usize {
    10
}

/// Options for a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Candidate-list size requested from the index backend per strategy.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Page size for downstream pagination; echoed, not applied here.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default)]
    pub offset: usize,
    /// Backend sort expressions, `"field:order"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<String>>,
    /// Backend filter expressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
    /// Per-request edit-distance cap; falls back to the configured
    /// `max_levenshtein_distance` when absent.
    #[serde(default)]
    pub max_distance: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            per_page: default_per_page(),
            offset: 0,
            sort: None,
            filters: None,
            max_distance: None,
        }
    }
}

impl SearchOptions {
    /// Clamp out-of-range values instead of rejecting the request.
    pub fn normalized(&self) -> Self {
        let mut options = self.clone();
        options.limit = options.limit.clamp(1, 1_000_000);
        options.max_distance = options.max_distance.map(|d| d.min(10));
        options
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index_name: String,
    #[serde(default)]
    pub query_data: Option<QueryInput>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub options: SearchOptions,
}
