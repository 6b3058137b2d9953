//! Reverse synonym lookup: any surface form to its canonical base.
//!
//! The configuration ships a `base -> [variants]` table; flattening it into a
//! surface-to-base map keeps `is_synonym` O(1). Two words are synonyms iff
//! they resolve to the same base, so synonymy is symmetric by construction.

use std::collections::HashMap;

/// Flattened synonym table, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct SynonymIndex {
    canonical: HashMap<String, String>,
}

impl SynonymIndex {
    pub fn from_table(table: &HashMap<String, Vec<String>>) -> Self {
        let mut canonical = HashMap::new();
        for (base, variants) in table {
            let base_lower = base.to_lowercase();
            canonical.insert(base_lower.clone(), base_lower.clone());
            for variant in variants {
                canonical.insert(variant.to_lowercase(), base_lower.clone());
            }
        }
        Self { canonical }
    }

    /// Canonical base for a surface form, if the word is known.
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.canonical.get(&word.to_lowercase()).map(String::as_str)
    }

    /// True iff both words resolve to the same canonical base.
    pub fn is_synonym(&self, w1: &str, w2: &str) -> bool {
        match (self.lookup(w1), self.lookup(w2)) {
            (Some(b1), Some(b2)) => b1 == b2,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
