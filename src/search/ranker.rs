//! Deduplication, scoring, and deterministic ordering of candidates.
//!
//! Candidates arrive keyed by retrieval strategy. Deduplication walks the
//! strategies in fixed priority order so the highest-priority discovery wins
//! the `_discovery_strategy` stamp. Scoring runs the full per-hit pipeline,
//! then a stable multi-key sort orders the survivors. The ordering depends
//! only on the inputs: no clock, no hash-map iteration order, no scheduling
//! artifact.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::scoring::ScoringEngine;
use crate::types::{Document, MatchType, QueryData, ScoredHit, SearchOptions, Strategy};

/// Candidate lists keyed by the strategy that retrieved them.
pub type StrategyResults = HashMap<Strategy, Vec<Document>>;

/// Ranked output: survivors in final order plus the size of the deduplicated
/// candidate set before score filtering.
#[derive(Debug)]
pub struct Ranked {
    pub hits: Vec<ScoredHit>,
    pub total_before_filter: usize,
}

pub struct Ranker {
    engine: Arc<ScoringEngine>,
}

impl Ranker {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Self { engine }
    }

    pub fn rank(
        &self,
        mut results: StrategyResults,
        query: &QueryData,
        options: &SearchOptions,
    ) -> Ranked {
        let unique = deduplicate(&mut results);
        let total_before_filter = unique.len();

        let config = self.engine.config();
        let max_distance = options
            .max_distance
            .unwrap_or(config.max_levenshtein_distance);
        let mut keyed: Vec<(String, ScoredHit)> = Vec::with_capacity(unique.len());

        for (strategy, doc) in unique {
            let (main, _phonetic, final_score) = self.engine.score(&doc, query, max_distance);

            let mut score = final_score.score;
            let mut capped = false;
            if final_score.match_type == MatchType::ExactFull {
                // Only a full exact match may attain the exact threshold.
                score = score.min(config.exact_threshold);
            } else if score >= config.exact_threshold {
                score = config.exact_full_cap;
                capped = true;
            }

            if score < config.min_score {
                continue;
            }

            let key = doc.dedup_key();
            keyed.push((
                key,
                ScoredHit {
                    doc,
                    score,
                    match_type: final_score.match_type,
                    match_priority: config.priority_of(final_score.match_type),
                    match_method: final_score.method,
                    discovery_strategy: strategy,
                    capped,
                    penalty_indices: Some(main.penalties),
                },
            ));
        }

        // Vec::sort_by is stable, so equal hits keep their dedup order.
        keyed.sort_by(|(key_a, a), (key_b, b)| {
            compare_hits(a, b).then_with(|| key_a.cmp(key_b))
        });

        let mut hits: Vec<ScoredHit> = keyed.into_iter().map(|(_, hit)| hit).collect();

        // Exact short-circuit: one exact hit hides everything below it.
        if hits.iter().any(|h| h.score >= config.exact_threshold) {
            hits.retain(|h| h.score >= config.exact_threshold);
            debug!(exact = hits.len(), "exact short-circuit engaged");
        }

        Ranked {
            hits,
            total_before_filter,
        }
    }
}

/// Walk strategies in priority order; the first strategy to surface a
/// document keeps it.
fn deduplicate(results: &mut StrategyResults) -> Vec<(Strategy, Document)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for strategy in Strategy::PRIORITY_ORDER {
        for doc in results.remove(&strategy).unwrap_or_default() {
            if seen.insert(doc.dedup_key()) {
                unique.push((strategy, doc));
            }
        }
    }

    unique
}

const EXTRA_RATIO_EPSILON: f64 = 0.01;
const LENGTH_RATIO_EPSILON: f64 = 0.001;

/// Multi-key comparator: score descending, priority ascending, then penalty
/// tie-breaks on the winning field. The identity tie-break lives with the
/// caller, which has the keys precomputed.
fn compare_hits(a: &ScoredHit, b: &ScoredHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.match_priority.cmp(&b.match_priority))
        .then_with(|| compare_penalties(a, b))
}

fn compare_penalties(a: &ScoredHit, b: &ScoredHit) -> Ordering {
    let (pa, pb) = match (&a.penalty_indices, &b.penalty_indices) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return Ordering::Equal,
    };

    if (pa.extra_length_ratio - pb.extra_length_ratio).abs() > EXTRA_RATIO_EPSILON {
        return pa.extra_length_ratio.total_cmp(&pb.extra_length_ratio);
    }
    if (pa.length_ratio - pb.length_ratio).abs() > LENGTH_RATIO_EPSILON {
        return pb.length_ratio.total_cmp(&pa.length_ratio);
    }
    pa.avg_distance.total_cmp(&pb.avg_distance)
}
