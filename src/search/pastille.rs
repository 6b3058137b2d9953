//! Per-user enrichment of restaurant hits.
//!
//! Annotates each hit with `isDeleted`, `isWaiting`, `isModified`, and
//! `hasFavori`. The three lookups behind the flags live in an external store
//! abstracted by [`PastilleStore`]; this module owns the merge rules and the
//! user-id validation. A failed lookup fails the request: returning
//! unannotated hits silently would be worse than an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::SearchError;
use crate::types::document::value_as_i64;

/// Pending-modification row for one restaurant.
#[derive(Debug, Clone)]
pub struct ModificationRow {
    pub status: i64,
    pub action: String,
}

/// External store backing the pastille lookups.
#[async_trait]
pub trait PastilleStore: Send + Sync {
    /// Deletion flag per restaurant id.
    async fn deleted_flags(&self, ids: &[i64]) -> Result<HashMap<i64, i64>, SearchError>;

    /// Pending modification per restaurant id.
    async fn modification_rows(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<i64, ModificationRow>, SearchError>;

    /// Restaurant ids favourited by this user.
    async fn favourite_ids(&self, user_id: i64, ids: &[i64]) -> Result<HashSet<i64>, SearchError>;
}

/// Merge layer between ranked hits and the pastille store.
pub struct PastilleService {
    store: Arc<dyn PastilleStore>,
}

impl PastilleService {
    pub fn new(store: Arc<dyn PastilleStore>) -> Self {
        Self { store }
    }

    /// Annotate hits in place. Hits without an integer-coercible `id` pass
    /// through untouched; an invalid user id only disables the favourites
    /// lookup, never the base annotations.
    pub async fn annotate(
        &self,
        hits: &mut [Value],
        user_id: Option<i64>,
    ) -> Result<(), SearchError> {
        if hits.is_empty() {
            return Ok(());
        }

        let mut ids: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for hit in hits.iter() {
            if let Some(id) = hit.get("id").and_then(value_as_i64) {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        let user = match user_id {
            Some(id) if id > 0 => Some(id),
            Some(id) => {
                warn!(user_id = id, "invalid user id, skipping favourites lookup");
                None
            }
            None => None,
        };

        let (deleted, modifications, favourites) = tokio::try_join!(
            self.store.deleted_flags(&ids),
            self.store.modification_rows(&ids),
            async {
                match user {
                    Some(user_id) => self.store.favourite_ids(user_id, &ids).await,
                    None => Ok(HashSet::new()),
                }
            }
        )?;

        for hit in hits.iter_mut() {
            let Some(obj) = hit.as_object_mut() else {
                continue;
            };
            let Some(id) = obj.get("id").and_then(value_as_i64) else {
                continue;
            };

            obj.insert(
                "isDeleted".to_string(),
                json!(deleted.get(&id).copied().unwrap_or(0)),
            );

            let modification = modifications.get(&id);
            obj.insert(
                "isWaiting".to_string(),
                json!(modification.is_some_and(|m| m.status == -1)),
            );
            obj.insert(
                "isModified".to_string(),
                json!(modification.is_some_and(|m| m.action == "modifier")),
            );

            obj.insert(
                "hasFavori".to_string(),
                json!(user.is_some() && favourites.contains(&id)),
            );
        }

        Ok(())
    }
}
