//! Token-level matching over precomputed phonetic encodings.
//!
//! Both sides arrive as space-separated soundex-like tokens; this scorer
//! never computes phonetics itself. A strict pass runs first; when it stays
//! under the phonetic floor, a tolerant pass may replace it, but only if it
//! actually improves the match ratio.

use crate::types::{Document, MatchType, QueryData};

use super::distance::StringDistance;

/// Minimum token length for the prefix acceptance rule.
const PREFIX_MIN_LEN: usize = 4;
/// Minimum token length for the tolerant edit-distance rule.
const TOLERANT_MIN_LEN: usize = 6;
/// Strict scores under this floor trigger the tolerant retry.
const TOLERANT_RETRY_FLOOR: f64 = 6.0;

/// Alternative score computed from phonetic tokens.
#[derive(Debug, Clone)]
pub struct PhoneticScore {
    pub score: f64,
    pub ratio: f64,
    pub match_type: MatchType,
}

/// Phonetic token matcher; borrows the process-wide distance memo.
pub struct PhoneticScorer<'a> {
    distance: &'a StringDistance,
}

impl<'a> PhoneticScorer<'a> {
    pub fn new(distance: &'a StringDistance) -> Self {
        Self { distance }
    }

    /// Score a candidate from its `name_soundex` tokens. Returns `None` when
    /// either side has no usable tokens.
    pub fn score(&self, doc: &Document, query: &QueryData) -> Option<PhoneticScore> {
        let query_soundex = query.soundex.trim();
        let hit_soundex = doc.name_soundex.as_deref().unwrap_or_default().trim();
        if query_soundex.is_empty() || hit_soundex.is_empty() {
            return None;
        }

        let query_tokens = phonetic_tokens(query_soundex);
        let hit_tokens = phonetic_tokens(hit_soundex);
        if query_tokens.is_empty() || hit_tokens.is_empty() {
            return None;
        }

        let strict = self.match_tokens(&query_tokens, &hit_tokens, false);
        let mut ratio = strict as f64 / query_tokens.len() as f64;
        let mut match_type = MatchType::PhoneticStrict;
        let mut score = banded_score(ratio);

        if score < TOLERANT_RETRY_FLOOR {
            let tolerant = self.match_tokens(&query_tokens, &hit_tokens, true);
            let tolerant_ratio = tolerant as f64 / query_tokens.len() as f64;
            if tolerant_ratio > ratio {
                ratio = tolerant_ratio;
                match_type = MatchType::PhoneticTolerant;
                score = banded_score(ratio);
            }
        }

        Some(PhoneticScore {
            score,
            ratio,
            match_type,
        })
    }

    /// Count query tokens accepted against unused hit tokens. The scan stops
    /// at the first acceptable token: equality, a prefix relation between
    /// long-enough tokens, or (tolerant mode) one edit between long tokens.
    fn match_tokens(&self, query_tokens: &[String], hit_tokens: &[String], tolerant: bool) -> usize {
        let mut used = vec![false; hit_tokens.len()];
        let mut matches = 0;

        for query_token in query_tokens {
            let mut accepted = None;

            for (idx, hit_token) in hit_tokens.iter().enumerate() {
                if used[idx] {
                    continue;
                }

                if query_token == hit_token {
                    accepted = Some(idx);
                    break;
                }

                let min_len = query_token
                    .chars()
                    .count()
                    .min(hit_token.chars().count());
                if min_len >= PREFIX_MIN_LEN
                    && (query_token.starts_with(hit_token.as_str())
                        || hit_token.starts_with(query_token.as_str()))
                {
                    accepted = Some(idx);
                    break;
                }

                if tolerant
                    && min_len >= TOLERANT_MIN_LEN
                    && self.distance.distance(query_token, hit_token, Some(1)) <= 1
                {
                    accepted = Some(idx);
                    break;
                }
            }

            if let Some(idx) = accepted {
                used[idx] = true;
                matches += 1;
            }
        }

        matches
    }
}

/// Tokens of length 1 carry no phonetic signal and are dropped.
fn phonetic_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// `8 * ratio`, capped by ratio band: full matches top out at 7.5, strong
/// partials at 7.0, anything weaker at 6.0.
fn banded_score(ratio: f64) -> f64 {
    let score = 8.0 * ratio;
    if ratio == 1.0 {
        score.min(7.5)
    } else if ratio >= 0.66 {
        score.min(7.0)
    } else {
        score.min(6.0)
    }
}
