//! Bounded Levenshtein distance with a shared memoization layer.
//!
//! The memo stores the *true* distance keyed on the unordered string pair, so
//! a capped call can never poison the cache for a later call with a different
//! cap. The length-difference lower bound short-circuits capped calls before
//! touching the cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Bound on the memo table. Eviction order is only deterministic under
/// serialized access; correctness of returned values never depends on it.
pub const DISTANCE_CACHE_CAPACITY: usize = 4096;

/// Levenshtein distance calculator with a bounded LRU memo.
///
/// Process-wide and immutable after construction; safe for concurrent use.
/// At worst a distance is computed twice under contention.
pub struct StringDistance {
    cache: Mutex<LruCache<(String, String), usize>>,
}

impl StringDistance {
    pub fn new() -> Self {
        Self::with_capacity(DISTANCE_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Levenshtein distance between `a` and `b` with unit costs.
    ///
    /// If either string is empty, returns `max(|a|, |b|)`. When `max` is
    /// supplied and the true distance exceeds it, returns `max + 1`. Lengths
    /// are counted in characters, not bytes.
    pub fn distance(&self, a: &str, b: &str, max: Option<usize>) -> usize {
        if a.is_empty() || b.is_empty() {
            return a.chars().count().max(b.chars().count());
        }

        if let Some(cap) = max {
            // Length difference is a lower bound on edit distance.
            let diff = a.chars().count().abs_diff(b.chars().count());
            if diff > cap {
                return cap + 1;
            }
        }

        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };

        let dist = {
            let mut cache = self.cache.lock();
            match cache.get(&key) {
                Some(&cached) => cached,
                None => {
                    let computed = levenshtein(a, b);
                    cache.put(key, computed);
                    computed
                }
            }
        };

        match max {
            Some(cap) if dist > cap => cap + 1,
            _ => dist,
        }
    }

    /// Length-adaptive cap: short words tolerate fewer edits.
    pub fn dynamic_max(s: &str) -> usize {
        match s.chars().count() {
            0..=3 => 1,
            4..=6 => 2,
            7..=10 => 3,
            _ => 4,
        }
    }
}

impl Default for StringDistance {
    fn default() -> Self {
        Self::new()
    }
}

/// Full single-row DP over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut dp: Vec<usize> = (0..=b_len).collect();

    for (i, ac) in a.chars().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;

        for (j, bc) in b.chars().enumerate() {
            let temp = dp[j + 1];
            let cost = usize::from(ac != bc);
            dp[j + 1] = (dp[j + 1] + 1).min(dp[j] + 1).min(prev + cost);
            prev = temp;
        }
    }

    dp[b_len]
}
