//! Final score hybridization between the textual and phonetic signals.
//!
//! A strong textual score stands alone. A middling one blends with the
//! phonetic score under a weight that grows with the textual score itself.
//! A weak one falls back to the phonetic score when that is better.

use crate::types::{MatchMethod, MatchType};

use super::composer::MainScore;
use super::phonetic::PhoneticScore;

/// Textual scores at or above this stand alone.
const TEXT_ONLY_THRESHOLD: f64 = 8.5;
/// Lower bound of the weighted-blend band.
const HYBRID_MIN_SCORE: f64 = 6.0;

/// Hybridized outcome for one candidate.
#[derive(Debug, Clone)]
pub struct FinalScore {
    pub score: f64,
    pub match_type: MatchType,
    pub method: MatchMethod,
}

/// Combine the composed textual score with the optional phonetic score.
pub fn finalize(main: &MainScore, phonetic: Option<&PhoneticScore>) -> FinalScore {
    let text_score = main.total_score;
    let phonetic_score = phonetic.map_or(0.0, |p| p.score);

    if text_score >= TEXT_ONLY_THRESHOLD {
        return FinalScore {
            score: text_score,
            match_type: main.match_type,
            method: MatchMethod::TextOnly,
        };
    }

    if (HYBRID_MIN_SCORE..TEXT_ONLY_THRESHOLD).contains(&text_score) && phonetic_score > 0.0 {
        let text_weight = 0.7 + text_score / 40.0;
        let phonetic_weight = 1.0 - text_weight;
        let score = round2(text_score * text_weight + phonetic_score * phonetic_weight);
        return FinalScore {
            score,
            match_type: MatchType::Hybrid,
            method: MatchMethod::Weighted,
        };
    }

    if let Some(phonetic) = phonetic {
        if phonetic.score > text_score {
            return FinalScore {
                score: phonetic.score,
                match_type: phonetic.match_type,
                method: MatchMethod::PhoneticFallback,
            };
        }
    }

    FinalScore {
        score: text_score,
        match_type: main.match_type,
        method: MatchMethod::TextOnly,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::evaluator::Penalties;
    use crate::scoring::composer::WinningStrategy;

    fn main_score(total: f64, match_type: MatchType) -> MainScore {
        MainScore {
            name_search_score: total,
            no_space_score: 0.0,
            base_score: total,
            bonus: 0.0,
            total_score: total,
            winning_strategy: WinningStrategy::NameSearch,
            match_type,
            match_priority: 0,
            penalties: Penalties::default(),
            all_words_found: true,
        }
    }

    fn phonetic(score: f64) -> PhoneticScore {
        PhoneticScore {
            score,
            ratio: 1.0,
            match_type: MatchType::PhoneticStrict,
        }
    }

    #[test]
    fn test_strong_text_ignores_phonetic() {
        let result = finalize(&main_score(9.2, MatchType::NearPerfect), Some(&phonetic(7.5)));
        assert_eq!(result.score, 9.2);
        assert_eq!(result.match_type, MatchType::NearPerfect);
        assert_eq!(result.method, MatchMethod::TextOnly);
    }

    #[test]
    fn test_middling_text_blends() {
        let result = finalize(&main_score(7.0, MatchType::FuzzyFull), Some(&phonetic(7.5)));
        // w_text = 0.7 + 7/40 = 0.875
        assert_eq!(result.score, round2(7.0 * 0.875 + 7.5 * 0.125));
        assert_eq!(result.match_type, MatchType::Hybrid);
        assert_eq!(result.method, MatchMethod::Weighted);
    }

    #[test]
    fn test_weak_text_falls_back_to_phonetic() {
        let result = finalize(&main_score(2.0, MatchType::FuzzyPartial), Some(&phonetic(6.5)));
        assert_eq!(result.score, 6.5);
        assert_eq!(result.match_type, MatchType::PhoneticStrict);
        assert_eq!(result.method, MatchMethod::PhoneticFallback);
    }

    #[test]
    fn test_no_phonetic_keeps_text() {
        let result = finalize(&main_score(4.0, MatchType::FuzzyPartial), None);
        assert_eq!(result.score, 4.0);
        assert_eq!(result.method, MatchMethod::TextOnly);
    }

    #[test]
    fn test_middling_text_without_phonetic_stays_text_only() {
        let result = finalize(&main_score(7.0, MatchType::FuzzyFull), None);
        assert_eq!(result.score, 7.0);
        assert_eq!(result.match_type, MatchType::FuzzyFull);
        assert_eq!(result.method, MatchMethod::TextOnly);
    }
}
