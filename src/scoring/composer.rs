//! Main score composition over the three candidate views.
//!
//! `name_search` and `no_space` compete for the base score; the `name` view
//! only ever contributes a bounded bonus. `no_space` is a specialty strategy:
//! it must clear `no_space_min_score` or stay silent.

use crate::config::ScoringConfig;
use crate::types::{Document, MatchType, QueryData};

use super::distance::StringDistance;
use super::evaluator::{FieldEvaluation, FieldEvaluator, Penalties};
use super::synonyms::SynonymIndex;

/// Which field view won the base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinningStrategy {
    NameSearch,
    NoSpace,
    None,
}

/// Composed textual score for one candidate.
#[derive(Debug, Clone)]
pub struct MainScore {
    pub name_search_score: f64,
    pub no_space_score: f64,
    pub base_score: f64,
    pub bonus: f64,
    pub total_score: f64,
    pub winning_strategy: WinningStrategy,
    pub match_type: MatchType,
    pub match_priority: i32,
    /// Penalty bundle of the winning field, used by ranking tie-breaks.
    pub penalties: Penalties,
    pub all_words_found: bool,
}

impl MainScore {
    fn empty_query(config: &ScoringConfig) -> Self {
        Self {
            name_search_score: 0.0,
            no_space_score: 0.0,
            base_score: 0.0,
            bonus: 0.0,
            total_score: 0.0,
            winning_strategy: WinningStrategy::None,
            match_type: MatchType::Partial,
            match_priority: config.priority_of(MatchType::Partial),
            penalties: Penalties::default(),
            all_words_found: false,
        }
    }
}

/// Runs the evaluator against the three views of a candidate and composes
/// the final textual score.
pub struct ScoreComposer<'a> {
    config: &'a ScoringConfig,
    distance: &'a StringDistance,
    synonyms: &'a SynonymIndex,
    max_distance: usize,
}

impl<'a> ScoreComposer<'a> {
    pub fn new(
        config: &'a ScoringConfig,
        distance: &'a StringDistance,
        synonyms: &'a SynonymIndex,
        max_distance: usize,
    ) -> Self {
        Self {
            config,
            distance,
            synonyms,
            max_distance,
        }
    }

    pub fn compose(&self, doc: &Document, query: &QueryData) -> MainScore {
        if query.words_cleaned.is_empty() {
            return MainScore::empty_query(self.config);
        }

        let evaluator = FieldEvaluator::new(self.max_distance, self.distance, self.synonyms);

        let name_search_words = tokenize(doc.name_search.as_deref().unwrap_or_default());
        let no_space_words = tokenize(doc.name_no_space.as_deref().unwrap_or_default());
        let name_words = tokenize(doc.display_name());

        let eval_search =
            evaluator.evaluate(&query.words_cleaned, &name_search_words, &query.cleaned);
        let name_search_score = self.adjusted_score(&eval_search);

        let eval_no_space =
            evaluator.evaluate(&query.words_no_space, &no_space_words, &query.no_space);
        let mut no_space_score = self.adjusted_score(&eval_no_space);
        if no_space_score < self.config.no_space_min_score {
            no_space_score = 0.0;
        }

        let search_valid = name_search_score > 0.0 && eval_search.found_count > 0;
        let no_space_valid = no_space_score > 0.0 && eval_no_space.found_count > 0;

        let (winning_strategy, base_score, winning_eval) =
            if no_space_valid && (!search_valid || no_space_score >= name_search_score) {
                (WinningStrategy::NoSpace, no_space_score, &eval_no_space)
            } else if search_valid {
                (WinningStrategy::NameSearch, name_search_score, &eval_search)
            } else {
                (WinningStrategy::None, 0.0, &eval_search)
            };

        let eval_name = evaluator.evaluate(&query.words_original, &name_words, &query.original);
        let bonus = self.name_bonus(&eval_name, query.words_original.len());

        let total_score = (base_score + bonus).min(12.0);
        let match_type = self.classify(winning_strategy, winning_eval, total_score);

        MainScore {
            name_search_score,
            no_space_score,
            base_score,
            bonus,
            total_score,
            winning_strategy,
            match_type,
            match_priority: self.config.priority_of(match_type),
            penalties: winning_eval.penalties.clone(),
            all_words_found: winning_eval.penalties.missing == 0,
        }
    }

    /// Raw field score minus the weighted penalties, floored at zero. A field
    /// with no alignment at all scores zero outright.
    fn adjusted_score(&self, eval: &FieldEvaluation) -> f64 {
        if eval.found_count == 0 {
            return 0.0;
        }

        let raw = (10.0 - eval.total_distance as f64).clamp(0.0, 10.0);
        let p = &eval.penalties;
        let penalty = self.config.w_missing * p.missing as f64
            + self.config.w_fuzzy * p.avg_distance.max(0.0)
            + self.config.w_ratio * (1.0 - p.length_ratio.clamp(0.0, 1.0))
            + self.config.w_extra_length * p.extra_length_ratio * 10.0;

        (raw - penalty).max(0.0)
    }

    /// Progressive bonus from the display-name view, gated on word-count and
    /// extra-length ratios, then attenuated toward the lower gate.
    fn name_bonus(&self, eval_name: &FieldEvaluation, query_word_count: usize) -> f64 {
        let name_word_count = eval_name.result_count;
        let word_count_ratio = if name_word_count > 0 {
            query_word_count.min(name_word_count) as f64
                / query_word_count.max(name_word_count) as f64
        } else {
            0.0
        };
        let extra_length_ratio = eval_name.extra_length_ratio;

        if word_count_ratio < self.config.bonus_word_ratio_min
            || extra_length_ratio > self.config.bonus_extra_ratio_max
        {
            return 0.0;
        }

        let score_terms: f64 = eval_name
            .found
            .iter()
            .map(|alignment| match alignment.distance {
                0 => 1.0,
                1 => 0.7,
                2 => 0.4,
                _ => 0.2,
            })
            .sum();
        let score_ratio = score_terms / query_word_count.max(1) as f64;
        let base = self.config.bonus_max * score_ratio;

        let reduction = self.config.bonus_a_missing * eval_name.penalties.missing as f64
            + self.config.bonus_c_avgdist * eval_name.average_distance.max(0.0)
            + self.config.bonus_max * extra_length_ratio * 0.6;
        let bonus = (base - reduction).clamp(0.0, self.config.bonus_max);

        let attenuation_range = 1.0 - self.config.bonus_word_ratio_min;
        if attenuation_range <= f64::EPSILON {
            return bonus;
        }
        let attenuation =
            ((word_count_ratio - self.config.bonus_word_ratio_min) / attenuation_range)
                .clamp(0.0, 1.0);

        bonus * attenuation
    }

    fn classify(
        &self,
        winner: WinningStrategy,
        eval: &FieldEvaluation,
        total_score: f64,
    ) -> MatchType {
        if eval.found_count == 0 {
            return MatchType::Partial;
        }

        let missing = eval.penalties.missing;
        let extra_ratio = eval.penalties.extra_length_ratio;

        let match_type = if eval.average_distance == 0.0 {
            if missing == 0 && extra_ratio == 0.0 {
                MatchType::ExactFull
            } else if missing == 0 {
                if winner == WinningStrategy::NoSpace {
                    MatchType::NoSpaceMatch
                } else {
                    MatchType::ExactWithExtras
                }
            } else {
                MatchType::ExactWithMissing
            }
        } else if missing == 0 {
            MatchType::FuzzyFull
        } else {
            MatchType::FuzzyPartial
        };

        if match_type == MatchType::FuzzyFull && total_score >= 8.0 {
            MatchType::NearPerfect
        } else {
            match_type
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
