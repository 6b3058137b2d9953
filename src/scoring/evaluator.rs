//! Greedy alignment of query words to candidate words.
//!
//! Each query word claims at most one candidate position, scanned in
//! ascending index order so ties are stable across runs. A pair matches
//! exactly, as synonyms, or within a bounded edit distance; the per-pair cap
//! is the smaller of the request cap and the length-adaptive cap for the
//! query word.

use serde::{Deserialize, Serialize};

use super::distance::StringDistance;
use super::synonyms::SynonymIndex;

/// How a single word pair matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Synonym,
    Levenshtein,
}

/// One query-word to candidate-word assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alignment {
    pub query_word: String,
    pub matched_word: String,
    pub distance: usize,
    #[serde(rename = "type")]
    pub kind: MatchKind,
    /// Index into the candidate token sequence; consumed at most once per
    /// field evaluation.
    pub position: usize,
}

/// Penalty inputs derived from one field evaluation. Serialized on hits as
/// `_penalty_indices` and reused by the ranker's tie-breaks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Penalties {
    pub missing: usize,
    pub avg_distance: f64,
    pub length_ratio: f64,
    pub coverage_ratio: f64,
    pub extra_length: usize,
    pub extra_length_ratio: f64,
}

/// Full outcome of evaluating one candidate field against the query words.
#[derive(Debug, Clone, Default)]
pub struct FieldEvaluation {
    pub found: Vec<Alignment>,
    pub not_found: Vec<String>,
    pub total_distance: usize,
    pub average_distance: f64,
    pub found_count: usize,
    pub query_count: usize,
    pub result_count: usize,
    /// Summed character length of candidate tokens no query word claimed.
    pub extra_length: usize,
    pub extra_length_ratio: f64,
    pub penalties: Penalties,
}

/// Per-field evaluator; borrows the process-wide distance memo and synonym
/// index, carries the per-request distance cap.
pub struct FieldEvaluator<'a> {
    max_distance: usize,
    distance: &'a StringDistance,
    synonyms: &'a SynonymIndex,
}

impl<'a> FieldEvaluator<'a> {
    pub fn new(
        max_distance: usize,
        distance: &'a StringDistance,
        synonyms: &'a SynonymIndex,
    ) -> Self {
        Self {
            max_distance,
            distance,
            synonyms,
        }
    }

    fn word_match(&self, query_word: &str, candidate_word: &str) -> (usize, MatchKind) {
        let q = query_word.to_lowercase();
        let c = candidate_word.to_lowercase();

        if q == c {
            return (0, MatchKind::Exact);
        }
        if self.synonyms.is_synonym(&q, &c) {
            return (0, MatchKind::Synonym);
        }

        let cap = self.max_distance.min(StringDistance::dynamic_max(&q));
        (self.distance.distance(&q, &c, Some(cap)), MatchKind::Levenshtein)
    }

    /// Best unused candidate for one query word. Strictly-lower distance
    /// wins, so the first candidate in index order keeps ties; a distance of
    /// zero ends the scan early. The winning position is consumed.
    fn best_match(
        &self,
        query_word: &str,
        candidate_words: &[String],
        used: &mut [bool],
    ) -> Option<Alignment> {
        let mut best: Option<Alignment> = None;
        let mut best_distance = self.max_distance + 1;

        for (position, candidate) in candidate_words.iter().enumerate() {
            if used[position] {
                continue;
            }

            let (distance, kind) = self.word_match(query_word, candidate);
            if distance < best_distance {
                best_distance = distance;
                best = Some(Alignment {
                    query_word: query_word.to_string(),
                    matched_word: candidate.clone(),
                    distance,
                    kind,
                    position,
                });
                if best_distance == 0 {
                    break;
                }
            }
        }

        if let Some(alignment) = &best {
            used[alignment.position] = true;
        }
        best
    }

    /// Align every query word against the candidate tokens and aggregate the
    /// field metrics. Invariant: `found_count + not_found.len() == query_count`.
    pub fn evaluate(
        &self,
        query_words: &[String],
        candidate_words: &[String],
        query_text: &str,
    ) -> FieldEvaluation {
        let mut found = Vec::new();
        let mut not_found = Vec::new();
        let mut total_distance = 0usize;
        let mut used = vec![false; candidate_words.len()];

        for query_word in query_words {
            match self.best_match(query_word, candidate_words, &mut used) {
                Some(alignment) if alignment.distance <= self.max_distance => {
                    total_distance += alignment.distance;
                    found.push(alignment);
                }
                _ => not_found.push(query_word.clone()),
            }
        }

        let found_count = found.len();
        let query_count = query_words.len();
        let result_count = candidate_words.len();

        let average_distance = if found_count > 0 {
            total_distance as f64 / found_count as f64
        } else {
            0.0
        };
        let length_ratio = if query_count > 0 && result_count > 0 {
            query_count.min(result_count) as f64 / query_count.max(result_count) as f64
        } else {
            1.0
        };
        let coverage_ratio = if query_count > 0 {
            found_count as f64 / query_count as f64
        } else {
            1.0
        };

        let extra_length: usize = candidate_words
            .iter()
            .enumerate()
            .filter(|(position, _)| !found.iter().any(|f| f.position == *position))
            .map(|(_, word)| word.chars().count())
            .sum();
        let query_length = query_text.chars().count();
        let extra_length_ratio = if query_length > 0 {
            extra_length as f64 / query_length as f64
        } else {
            0.0
        };

        FieldEvaluation {
            penalties: Penalties {
                missing: not_found.len(),
                avg_distance: average_distance,
                length_ratio,
                coverage_ratio,
                extra_length,
                extra_length_ratio,
            },
            found,
            not_found,
            total_distance,
            average_distance,
            found_count,
            query_count,
            result_count,
            extra_length,
            extra_length_ratio,
        }
    }
}
