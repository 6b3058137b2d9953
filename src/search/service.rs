//! Request orchestration: retrieval fan-out, ranking, dispersion,
//! enrichment, and response assembly.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::SearchError;
use crate::metrics;
use crate::scoring::{GeoDisperser, ScoringEngine};
use crate::types::{
    QueryData, QueryInput, ScoredHit, SearchOptions, SearchResponse, Strategy,
};

use super::backend::{RetrievalRequest, SearchBackend};
use super::cache::ResponseCache;
use super::pastille::PastilleService;
use super::ranker::{Ranker, StrategyResults};

/// Public entry point of the search pipeline.
///
/// Holds the process-wide scoring state and the external collaborators. One
/// instance serves all requests concurrently; nothing here is mutable after
/// construction except the bounded caches.
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    engine: Arc<ScoringEngine>,
    ranker: Ranker,
    disperser: Option<GeoDisperser>,
    pastille: Option<PastilleService>,
    cache: Option<ResponseCache>,
}

impl SearchService {
    pub fn new(
        config: &Config,
        backend: Arc<dyn SearchBackend>,
        pastille: Option<PastilleService>,
    ) -> Self {
        let engine = Arc::new(ScoringEngine::new(
            config.scoring.clone(),
            &config.synonyms,
        ));
        let disperser = config
            .geo
            .enabled
            .then(|| GeoDisperser::new(config.geo.grid_size));

        Self {
            backend,
            engine: Arc::clone(&engine),
            ranker: Ranker::new(engine),
            disperser,
            pastille,
            cache: ResponseCache::with_capacity(config.cache.capacity),
        }
    }

    /// Run one search. A structured query fans out over the retrieval
    /// strategies and goes through the full scoring pipeline; a raw string
    /// (or no query) issues a single retrieval against the display name and
    /// passes candidates through untouched.
    pub async fn search(
        &self,
        index_name: &str,
        query: Option<&QueryInput>,
        options: &SearchOptions,
        user_id: Option<i64>,
    ) -> Result<SearchResponse, SearchError> {
        let options = options.normalized();

        let cache_key = ResponseCache::key(index_name, query, &options, user_id);
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(cached) = cache.get(key) {
                debug!(index = index_name, "response cache hit");
                return Ok(cached);
            }
        }

        let response = match query {
            Some(QueryInput::Structured(query_data)) => {
                self.search_structured(index_name, query_data, &options, user_id)
                    .await?
            }
            Some(QueryInput::Text(text)) => {
                self.search_raw(index_name, text, &options, user_id).await?
            }
            None => self.search_raw(index_name, "", &options, user_id).await?,
        };

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.put(key, response.clone());
        }
        Ok(response)
    }

    /// Plain-text branch: no scoring, candidates pass through enrichment.
    async fn search_raw(
        &self,
        index_name: &str,
        text: &str,
        options: &SearchOptions,
        user_id: Option<i64>,
    ) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();

        let request = RetrievalRequest {
            index: index_name.to_string(),
            query: text.to_string(),
            attributes: vec!["name".to_string()],
            limit: options.limit,
            offset: options.offset,
            sort: options.sort.clone(),
            filters: options.filters.clone(),
        };
        let retrieved = self.backend.retrieve(&request).await?;

        let mut hits: Vec<Value> = retrieved
            .hits
            .iter()
            .map(|doc| serde_json::to_value(doc).unwrap_or(Value::Null))
            .collect();
        self.enrich(&mut hits, user_id).await?;

        info!(
            index = index_name,
            hits = hits.len(),
            "raw text search completed"
        );

        Ok(SearchResponse {
            total: hits.len(),
            hits,
            has_exact_results: false,
            exact_count: 0,
            total_before_filter: retrieved.estimated_total_hits,
            query_time_ms: metrics::elapsed_ms(started.elapsed()),
            preprocessing: None,
            memory_used_mb: Some(metrics::resident_memory_mb()),
            count_per_dep: BTreeMap::new(),
        })
    }

    /// Structured branch: parallel retrieval strategies, dedup, scoring,
    /// sort, optional dispersion, enrichment, histogram.
    async fn search_structured(
        &self,
        index_name: &str,
        query_data: &QueryData,
        options: &SearchOptions,
        user_id: Option<i64>,
    ) -> Result<SearchResponse, SearchError> {
        let strategies = retrieval_plan(query_data);

        let requests: Vec<RetrievalRequest> = strategies
            .iter()
            .map(|(_, query, attribute)| RetrievalRequest {
                index: index_name.to_string(),
                query: query.clone(),
                attributes: vec![attribute.to_string()],
                limit: options.limit,
                offset: 0,
                sort: options.sort.clone(),
                filters: options.filters.clone(),
            })
            .collect();

        // All-or-nothing: the first failure drops the remaining retrievals
        // and fails the request.
        let responses = try_join_all(
            requests
                .iter()
                .map(|request| self.backend.retrieve(request)),
        )
        .await?;

        let mut results = StrategyResults::new();
        for ((strategy, _, _), response) in strategies.into_iter().zip(responses) {
            results.insert(strategy, response.hits);
        }

        let scoring_started = Instant::now();
        let ranked = self.ranker.rank(results, query_data, options);
        let total_before_filter = ranked.total_before_filter;

        let config = self.engine.config();
        let exact_count = ranked
            .hits
            .iter()
            .filter(|hit| hit.score >= config.exact_threshold)
            .count();

        let hits_ranked = match &self.disperser {
            Some(disperser) => disperser.disperse(ranked.hits).hits,
            None => ranked.hits,
        };
        let query_time_ms = metrics::elapsed_ms(scoring_started.elapsed());

        let count_per_dep = count_per_dep(&hits_ranked);

        let mut hits: Vec<Value> = hits_ranked
            .iter()
            .map(|hit| serde_json::to_value(hit).unwrap_or(Value::Null))
            .collect();
        self.enrich(&mut hits, user_id).await?;

        info!(
            index = index_name,
            candidates = total_before_filter,
            hits = hits.len(),
            exact = exact_count,
            "structured search completed"
        );

        Ok(SearchResponse {
            total: hits.len(),
            hits,
            has_exact_results: exact_count > 0,
            exact_count,
            total_before_filter,
            query_time_ms,
            preprocessing: Some(query_data.clone()),
            memory_used_mb: Some(metrics::resident_memory_mb()),
            count_per_dep,
        })
    }

    async fn enrich(&self, hits: &mut [Value], user_id: Option<i64>) -> Result<(), SearchError> {
        if let Some(pastille) = &self.pastille {
            pastille.annotate(hits, user_id).await?;
        }
        Ok(())
    }
}

/// Retrieval strategies for a structured query: `(strategy, query text,
/// searchable attribute)`. Phonetic retrieval only runs with a usable
/// soundex.
fn retrieval_plan(query_data: &QueryData) -> Vec<(Strategy, String, &'static str)> {
    let name_search_query = if query_data.cleaned.is_empty() {
        query_data.original.clone()
    } else {
        query_data.cleaned.clone()
    };

    let mut plan = vec![
        (Strategy::NameSearch, name_search_query, "name_search"),
        (Strategy::NoSpace, query_data.no_space.clone(), "name_no_space"),
        (Strategy::Standard, query_data.original.clone(), "name"),
    ];
    if !query_data.soundex.trim().is_empty() {
        plan.push((Strategy::Phonetic, query_data.soundex.clone(), "name_soundex"));
    }
    plan
}

/// Histogram of hits per zero-padded department code. Hits without an
/// integer-coercible `dep` are counted nowhere but stay in the results.
fn count_per_dep(hits: &[ScoredHit]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for hit in hits {
        if let Some(dep) = hit.doc.dep_code() {
            *counts.entry(format!("{:02}", dep)).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, MatchMethod, MatchType};
    use serde_json::json;

    fn hit_with_dep(dep: Value) -> ScoredHit {
        let doc: Document = serde_json::from_value(json!({ "id": 1, "dep": dep })).unwrap();
        ScoredHit {
            doc,
            score: 5.0,
            match_type: MatchType::FuzzyFull,
            match_priority: 5,
            match_method: MatchMethod::TextOnly,
            discovery_strategy: Strategy::NameSearch,
            capped: false,
            penalty_indices: None,
        }
    }

    #[test]
    fn test_count_per_dep_pads_and_ignores_bad_values() {
        let hits = vec![
            hit_with_dep(json!(7)),
            hit_with_dep(json!("07")),
            hit_with_dep(json!(75)),
            hit_with_dep(json!("2A")),
            hit_with_dep(Value::Null),
        ];

        let counts = count_per_dep(&hits);
        assert_eq!(counts.get("07"), Some(&2));
        assert_eq!(counts.get("75"), Some(&1));
        assert_eq!(counts.len(), 2);
        // BTreeMap iterates sorted by key.
        let keys: Vec<&String> = counts.keys().collect();
        assert_eq!(keys, vec!["07", "75"]);
    }

    #[test]
    fn test_retrieval_plan_skips_phonetic_without_soundex() {
        let query = QueryData {
            original: "Petit".into(),
            cleaned: "petit".into(),
            no_space: "petit".into(),
            soundex: "  ".into(),
            original_length: 5,
            cleaned_length: 5,
            no_space_length: 5,
            words_cleaned: vec!["petit".into()],
            words_original: vec!["Petit".into()],
            words_no_space: vec!["petit".into()],
        };

        let plan = retrieval_plan(&query);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|(s, _, _)| *s != Strategy::Phonetic));

        let mut with_soundex = query.clone();
        with_soundex.soundex = "PT".into();
        let plan = retrieval_plan(&with_soundex);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[3].2, "name_soundex");
    }

    #[test]
    fn test_retrieval_plan_falls_back_to_original() {
        let query = QueryData {
            original: "Café".into(),
            cleaned: String::new(),
            no_space: String::new(),
            soundex: String::new(),
            original_length: 4,
            cleaned_length: 0,
            no_space_length: 0,
            words_cleaned: vec![],
            words_original: vec!["Café".into()],
            words_no_space: vec![],
        };

        let plan = retrieval_plan(&query);
        assert_eq!(plan[0].1, "Café");
    }
}
