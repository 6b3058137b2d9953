//! Bounded LRU cache for whole search responses.
//!
//! Keyed by the full request shape so two requests differing only in
//! options or user id never share an entry.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::types::{QueryInput, SearchOptions, SearchResponse};

pub struct ResponseCache {
    inner: Mutex<LruCache<String, SearchResponse>>,
}

impl ResponseCache {
    /// `None` when the configured capacity disables caching.
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            inner: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn key(
        index_name: &str,
        query: Option<&QueryInput>,
        options: &SearchOptions,
        user_id: Option<i64>,
    ) -> Option<String> {
        serde_json::to_string(&(index_name, query, options, user_id)).ok()
    }

    pub fn get(&self, key: &str) -> Option<SearchResponse> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, response: SearchResponse) {
        self.inner.lock().put(key, response);
    }
}
