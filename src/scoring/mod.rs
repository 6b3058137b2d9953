//! Scoring pipeline: distance, synonyms, field evaluation, composition,
//! phonetics, hybridization, and geographic dispersion.

pub mod composer;
pub mod dispersion;
pub mod distance;
pub mod evaluator;
pub mod hybrid;
pub mod phonetic;
pub mod synonyms;

use std::collections::HashMap;

pub use composer::{MainScore, ScoreComposer, WinningStrategy};
pub use dispersion::{Dispersed, GeoDisperser, GeoPoint};
pub use distance::StringDistance;
pub use evaluator::{Alignment, FieldEvaluation, FieldEvaluator, Penalties};
pub use hybrid::FinalScore;
pub use phonetic::{PhoneticScore, PhoneticScorer};
pub use synonyms::SynonymIndex;

use crate::config::ScoringConfig;
use crate::types::{Document, QueryData};

/// Process-wide scoring state: weights, the flattened synonym table, and the
/// Levenshtein memo. Immutable after construction and shared across requests.
pub struct ScoringEngine {
    config: ScoringConfig,
    distance: StringDistance,
    synonyms: SynonymIndex,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, synonym_table: &HashMap<String, Vec<String>>) -> Self {
        Self {
            config,
            distance: StringDistance::new(),
            synonyms: SynonymIndex::from_table(synonym_table),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Full per-candidate pipeline: compose the textual score, attempt the
    /// phonetic score, hybridize.
    pub fn score(
        &self,
        doc: &Document,
        query: &QueryData,
        max_distance: usize,
    ) -> (MainScore, Option<PhoneticScore>, FinalScore) {
        let composer = ScoreComposer::new(&self.config, &self.distance, &self.synonyms, max_distance);
        let main = composer.compose(doc, query);
        let phonetic = PhoneticScorer::new(&self.distance).score(doc, query);
        let final_score = hybrid::finalize(&main, phonetic.as_ref());
        (main, phonetic, final_score)
    }
}
