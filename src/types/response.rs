use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;
use super::query::QueryData;
use crate::scoring::evaluator::Penalties;

/// Retrieval strategy that surfaced a document. Order matters: deduplication
/// walks strategies in [`Strategy::PRIORITY_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NameSearch,
    NoSpace,
    Standard,
    Phonetic,
}

impl Strategy {
    pub const PRIORITY_ORDER: [Strategy; 4] = [
        Strategy::NameSearch,
        Strategy::NoSpace,
        Strategy::Standard,
        Strategy::Phonetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NameSearch => "name_search",
            Strategy::NoSpace => "no_space",
            Strategy::Standard => "standard",
            Strategy::Phonetic => "phonetic",
        }
    }
}

/// Typed classification of how a candidate matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactFull,
    ExactWithExtras,
    NoSpaceMatch,
    NearPerfect,
    PhoneticStrict,
    ExactWithMissing,
    FuzzyFull,
    Hybrid,
    PhoneticTolerant,
    FuzzyPartial,
    Partial,
}

/// How the final score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    TextOnly,
    Weighted,
    PhoneticFallback,
    Error,
}

/// A candidate document augmented with scoring annotations. The document's
/// own fields pass through untouched; every annotation is `_`-prefixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHit {
    #[serde(flatten)]
    pub doc: Document,

    #[serde(rename = "_score")]
    pub score: f64,

    #[serde(rename = "_match_type")]
    pub match_type: MatchType,

    #[serde(rename = "_match_priority")]
    pub match_priority: i32,

    #[serde(rename = "_match_method")]
    pub match_method: MatchMethod,

    #[serde(rename = "_discovery_strategy")]
    pub discovery_strategy: Strategy,

    #[serde(rename = "_capped", default, skip_serializing_if = "is_false")]
    pub capped: bool,

    #[serde(
        rename = "_penalty_indices",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub penalty_indices: Option<Penalties>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Response of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Enriched documents; scored hits on the structured path, raw documents
    /// on the plain-text path.
    pub hits: Vec<Value>,
    /// Number of returned hits.
    pub total: usize,
    pub has_exact_results: bool,
    pub exact_count: usize,
    /// Size of the deduplicated candidate set before score filtering.
    pub total_before_filter: usize,
    /// Wall time of the scoring pipeline, rounded to 2 decimals.
    pub query_time_ms: f64,
    #[serde(default)]
    pub preprocessing: Option<QueryData>,
    #[serde(default)]
    pub memory_used_mb: Option<f64>,
    /// Hit count per zero-padded 2-digit department code, sorted by key.
    #[serde(default)]
    pub count_per_dep: BTreeMap<String, usize>,
}
