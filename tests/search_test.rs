//! End-to-end pipeline tests over a mock index backend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use resto_search::error::SearchError;
use resto_search::search::{
    ModificationRow, PastilleService, PastilleStore, RetrievalRequest, RetrievalResponse,
    SearchBackend, SearchService,
};
use resto_search::types::{QueryData, QueryInput, SearchOptions};
use resto_search::Config;

/// Backend stub: hits are keyed by the searchable attribute each strategy
/// targets, so a document can be surfaced by specific strategies only.
#[derive(Default)]
struct MockBackend {
    by_attribute: HashMap<String, Vec<Value>>,
    estimated_total: usize,
    fail: bool,
}

impl MockBackend {
    fn with_hits(attribute: &str, hits: Vec<Value>) -> Self {
        let mut backend = Self::default();
        backend.estimated_total = hits.len();
        backend.by_attribute.insert(attribute.to_string(), hits);
        backend
    }

    fn add(mut self, attribute: &str, hits: Vec<Value>) -> Self {
        self.by_attribute.insert(attribute.to_string(), hits);
        self
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, SearchError> {
        if self.fail {
            return Err(SearchError::Backend("index unreachable".to_string()));
        }

        let attribute = request.attributes.first().cloned().unwrap_or_default();
        let hits = self
            .by_attribute
            .get(&attribute)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|value| serde_json::from_value(value).expect("valid fixture document"))
            .collect();

        Ok(RetrievalResponse {
            hits,
            estimated_total_hits: self.estimated_total,
        })
    }
}

fn service(backend: MockBackend) -> SearchService {
    SearchService::new(&Config::default(), Arc::new(backend), None)
}

fn service_with_config(backend: MockBackend, config: &Config) -> SearchService {
    SearchService::new(config, Arc::new(backend), None)
}

fn query_data(original: &str, soundex: &str) -> QueryData {
    let cleaned = original.to_lowercase();
    let no_space: String = cleaned.split_whitespace().collect();
    QueryData {
        original: original.to_string(),
        cleaned: cleaned.clone(),
        no_space: no_space.clone(),
        soundex: soundex.to_string(),
        original_length: original.chars().count(),
        cleaned_length: cleaned.chars().count(),
        no_space_length: no_space.chars().count(),
        words_cleaned: cleaned.split_whitespace().map(str::to_string).collect(),
        words_original: original.split_whitespace().map(str::to_string).collect(),
        words_no_space: if no_space.is_empty() {
            vec![]
        } else {
            vec![no_space]
        },
    }
}

fn structured(query: QueryData) -> QueryInput {
    QueryInput::Structured(Box::new(query))
}

#[tokio::test]
async fn test_exact_full_match() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![json!({
            "id": 1,
            "name": "Petit Resto",
            "name_search": "petit resto",
            "name_no_space": "petitresto"
        })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit Resto", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    assert!(response.has_exact_results);
    assert_eq!(response.exact_count, 1);
    let hit = &response.hits[0];
    assert_eq!(hit["_score"], json!(10.0));
    assert_eq!(hit["_match_type"], json!("exact_full"));
    assert_eq!(hit["_match_priority"], json!(0));
    assert_eq!(hit["_discovery_strategy"], json!("name_search"));
    assert!(response.preprocessing.is_some());
    assert!(response.memory_used_mb.unwrap() >= 0.0);
}

#[tokio::test]
async fn test_exact_short_circuit_hides_fuzzy_hits() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({
                "id": 1,
                "name": "Petit Resto",
                "name_search": "petit resto"
            }),
            json!({
                "id": 2,
                "name": "Petit Restp",
                "name_search": "petit restp"
            }),
        ],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit Resto", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(response.total_before_filter, 2);
    assert!(response
        .hits
        .iter()
        .all(|hit| hit["_score"].as_f64().unwrap() >= 10.0));
}

#[tokio::test]
async fn test_exact_with_extras_ranks_above_fuzzy_partial() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({
                "id": "fuzzy",
                "name": "Pxtyt Rysta Bar",
                "name_search": "pxtyt rysta bar"
            }),
            json!({
                "id": "extras",
                "name": "Petit Resto de la Gare",
                "name_search": "petit resto de la gare"
            }),
        ],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert!(!response.has_exact_results);
    let first = &response.hits[0];
    assert_eq!(first["id"], json!("extras"));
    assert_eq!(first["_match_type"], json!("exact_with_extras"));
    assert!(first["_score"].as_f64().unwrap() < 10.0);
}

#[tokio::test]
async fn test_near_perfect_fuzzy() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![json!({
            "id": 1,
            "name": "Restp",
            "name_search": "restp"
        })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Resto", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    let hit = &response.hits[0];
    let score = hit["_score"].as_f64().unwrap();
    if score >= 8.0 {
        assert_eq!(hit["_match_type"], json!("near_perfect"));
    } else {
        assert_eq!(hit["_match_type"], json!("fuzzy_full"));
    }
    assert_eq!(hit["_match_method"], json!("text_only"));
}

#[tokio::test]
async fn test_synonym_alignment_is_exact_full() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![json!({
            "id": 1,
            "name": "Saint Jean",
            "name_search": "saint jean"
        })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("St Jean", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert!(response.has_exact_results);
    assert_eq!(response.hits[0]["_match_type"], json!("exact_full"));
    assert_eq!(response.hits[0]["_score"], json!(10.0));
}

#[tokio::test]
async fn test_phonetic_fallback() {
    let mut query = query_data("", "");
    query.soundex = "KFE".to_string();

    let backend = MockBackend::with_hits(
        "name_soundex",
        vec![json!({
            "id": 9,
            "name": "Kafé",
            "name_soundex": "KFE"
        })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query)),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    let hit = &response.hits[0];
    assert_eq!(hit["_match_type"], json!("phonetic_strict"));
    assert_eq!(hit["_match_method"], json!("phonetic_fallback"));
    assert_eq!(hit["_discovery_strategy"], json!("phonetic"));
    let score = hit["_score"].as_f64().unwrap();
    assert!((6.0..=7.5).contains(&score));
}

#[tokio::test]
async fn test_dedup_across_strategies() {
    let doc = json!({
        "id": 1,
        "name": "Chez Marcel",
        "name_search": "chez marcel"
    });
    let backend = MockBackend::with_hits("name_search", vec![doc.clone()])
        .add("name", vec![doc.clone()])
        .add("name_no_space", vec![doc]);

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Chez Marcel", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total_before_filter, 1);
    assert_eq!(response.total, 1);
    assert_eq!(response.hits[0]["_discovery_strategy"], json!("name_search"));

    let ids: HashSet<String> = response
        .hits
        .iter()
        .map(|hit| hit["id"].to_string())
        .collect();
    assert_eq!(ids.len(), response.hits.len());
}

#[tokio::test]
async fn test_geo_dispersion_alternates_cells() {
    // Two clones of the same name in one Paris cell plus one in Marseille:
    // equal scores, so dispersion decides the order and must alternate.
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({
                "id": "p1",
                "name": "Bistro Central",
                "name_search": "bistro central",
                "_geo": { "lat": 48.85, "lng": 2.35 }
            }),
            json!({
                "id": "p2",
                "name": "Bistro Central",
                "name_search": "bistro central",
                "_geo": { "lat": 48.85, "lng": 2.35 }
            }),
            json!({
                "id": "m1",
                "name": "Bistro Central",
                "name_search": "bistro central",
                "_geo": { "lat": 43.30, "lng": 5.37 }
            }),
        ],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Bistro Central", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total, 3);
    let ids: Vec<&str> = response
        .hits
        .iter()
        .map(|hit| hit["id"].as_str().unwrap())
        .collect();
    // Marseille's cell key sorts first; the second slot must come from the
    // other cell.
    assert_eq!(ids, vec!["m1", "p1", "p2"]);
}

#[tokio::test]
async fn test_department_histogram() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({ "id": 1, "name_search": "petit resto", "name": "Petit Resto", "dep": 7 }),
            json!({ "id": 2, "name_search": "petit resto", "name": "Petit Resto", "dep": "07" }),
            json!({ "id": 3, "name_search": "petit resto", "name": "Petit Resto", "dep": 75 }),
            json!({ "id": 4, "name_search": "petit resto", "name": "Petit Resto", "dep": "2A" }),
        ],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit Resto", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    // The non-numeric department is ignored by the histogram but the hit
    // itself stays in the results.
    assert_eq!(response.total, 4);
    assert_eq!(response.count_per_dep.get("07"), Some(&2));
    assert_eq!(response.count_per_dep.get("75"), Some(&1));
    assert_eq!(response.count_per_dep.len(), 2);
}

#[tokio::test]
async fn test_empty_query_returns_well_formed_response() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![json!({ "id": 1, "name": "Petit Resto", "name_search": "petit resto" })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    // Every candidate scores 0 and falls under min_score.
    assert_eq!(response.total, 0);
    assert_eq!(response.total_before_filter, 1);
    assert!(!response.has_exact_results);
}

#[tokio::test]
async fn test_raw_text_branch_passes_candidates_through() {
    let backend = MockBackend::with_hits(
        "name",
        vec![json!({ "id": 1, "name": "Le Petit Resto", "rating": 4.5 })],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&QueryInput::Text("petit".to_string())),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(response.total_before_filter, 1);
    assert!(response.preprocessing.is_none());
    let hit = &response.hits[0];
    assert_eq!(hit["rating"], json!(4.5));
    assert!(hit.get("_score").is_none());
}

#[tokio::test]
async fn test_backend_failure_fails_request() {
    let backend = MockBackend {
        fail: true,
        ..Default::default()
    };

    let result = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit", ""))),
            &SearchOptions::default(),
            None,
        )
        .await;

    assert!(matches!(result, Err(SearchError::Backend(_))));
}

#[tokio::test]
async fn test_determinism_across_runs() {
    let build = || {
        MockBackend::with_hits(
            "name_search",
            vec![
                json!({ "id": 3, "name": "Resto C", "name_search": "resto c" }),
                json!({ "id": 1, "name": "Resto A", "name_search": "resto a" }),
                json!({ "id": 2, "name": "Resto B", "name_search": "resto b" }),
            ],
        )
    };

    // Disable the response cache so the second run goes through the whole
    // pipeline again.
    let mut config = Config::default();
    config.cache.capacity = 0;

    let run = |backend: MockBackend, config: Config| async move {
        let service = service_with_config(backend, &config);
        let response = service
            .search(
                "restaurants",
                Some(&structured(query_data("Resto", ""))),
                &SearchOptions::default(),
                None,
            )
            .await
            .unwrap();
        serde_json::to_string(&response.hits).unwrap()
    };

    let first = run(build(), config.clone()).await;
    let second = run(build(), config).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_scores_stay_in_range() {
    // High-scoring but never exact_full: the cap must hold them at 9.99 and
    // no short-circuit may engage.
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({ "id": 1, "name": "Petit Resto", "name_search": "petit resto bar" }),
            json!({ "id": 2, "name": "Petit Restaurant", "name_search": "grand petit restaurant" }),
            json!({ "id": 3, "name": "Le Petit", "name_search": "le petit" }),
        ],
    );

    let response = service(backend)
        .search(
            "restaurants",
            Some(&structured(query_data("Petit Resto", ""))),
            &SearchOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert!(!response.has_exact_results);
    assert_eq!(response.total, 3);
    for hit in &response.hits {
        let score = hit["_score"].as_f64().unwrap();
        assert!((0.0..=10.0).contains(&score));
        if hit["_match_type"] != json!("exact_full") {
            assert!(score <= 9.99);
        }
    }
}

/// Pastille store stub used to exercise the enrichment path end-to-end.
struct MemoryPastilleStore;

#[async_trait]
impl PastilleStore for MemoryPastilleStore {
    async fn deleted_flags(&self, ids: &[i64]) -> Result<HashMap<i64, i64>, SearchError> {
        Ok(ids.iter().map(|id| (*id, i64::from(*id == 2))).collect())
    }

    async fn modification_rows(
        &self,
        _ids: &[i64],
    ) -> Result<HashMap<i64, ModificationRow>, SearchError> {
        Ok(HashMap::from([(
            1,
            ModificationRow {
                status: -1,
                action: "modifier".to_string(),
            },
        )]))
    }

    async fn favourite_ids(
        &self,
        _user_id: i64,
        ids: &[i64],
    ) -> Result<HashSet<i64>, SearchError> {
        Ok(ids.iter().copied().filter(|id| *id == 1).collect())
    }
}

#[tokio::test]
async fn test_enrichment_annotates_hits() {
    let backend = MockBackend::with_hits(
        "name_search",
        vec![
            json!({ "id": 1, "name": "Petit Resto", "name_search": "petit resto" }),
            json!({ "id": 2, "name": "Petit Restaurant", "name_search": "petit restaurant" }),
        ],
    );
    let pastille = PastilleService::new(Arc::new(MemoryPastilleStore));
    let service = SearchService::new(&Config::default(), Arc::new(backend), Some(pastille));

    let response = service
        .search(
            "restaurants",
            Some(&structured(query_data("Petit Resto", ""))),
            &SearchOptions::default(),
            Some(42),
        )
        .await
        .unwrap();

    let by_id = |id: i64| {
        response
            .hits
            .iter()
            .find(|hit| hit["id"] == json!(id))
            .unwrap()
    };
    let first = by_id(1);
    assert_eq!(first["isDeleted"], json!(0));
    assert_eq!(first["isWaiting"], json!(true));
    assert_eq!(first["isModified"], json!(true));
    assert_eq!(first["hasFavori"], json!(true));
}
