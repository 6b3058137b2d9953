//! Deterministic geographic dispersion of ranked hits.
//!
//! Paginated result lists clustered in one city read poorly; round-robining
//! over a lat/lng grid spreads them out. Every ordering decision is derived
//! from the hits themselves: cells are visited in lexicographic key order and
//! items inside a cell are sorted by `(id, name, lat, lng)`, so the same
//! input always yields the same output. Hits without usable coordinates are
//! appended in their original order.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::document::{value_as_f64, Document};
use crate::types::ScoredHit;

/// Grid size in degrees; 0.1 is roughly 11 km.
pub const DEFAULT_GRID_SIZE: f64 = 0.1;

/// A usable geographic point extracted from a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Accepts `_geo.{lat,lng}`, top-level `lat`/`lng`, or `lat`/`long`;
    /// numbers or numeric strings.
    pub fn from_document(doc: &Document) -> Option<Self> {
        if let Some(geo) = &doc.geo {
            let lat = geo.lat.as_ref().and_then(value_as_f64)?;
            let lng = geo.lng.as_ref().and_then(value_as_f64)?;
            return Some(Self { lat, lng });
        }

        let lat = doc.lat.as_ref().and_then(value_as_f64)?;
        let lng = doc
            .lng
            .as_ref()
            .or(doc.long.as_ref())
            .and_then(value_as_f64)?;
        Some(Self { lat, lng })
    }
}

/// Outcome of one dispersion pass; the hit multiset is preserved exactly.
#[derive(Debug)]
pub struct Dispersed {
    pub hits: Vec<ScoredHit>,
    pub cells_used: usize,
    pub geo_hits: usize,
    pub non_geo_hits: usize,
}

/// Round-robin disperser over a fixed-size lat/lng grid.
pub struct GeoDisperser {
    grid_size: f64,
}

impl GeoDisperser {
    pub fn new(grid_size: f64) -> Self {
        let grid_size = if grid_size > 0.0 {
            grid_size
        } else {
            DEFAULT_GRID_SIZE
        };
        Self { grid_size }
    }

    fn cell_key(&self, point: &GeoPoint) -> String {
        let lat_cell = (point.lat / self.grid_size).floor() as i64;
        let lng_cell = (point.lng / self.grid_size).floor() as i64;
        format!("{}_{}", lat_cell, lng_cell)
    }

    pub fn disperse(&self, hits: Vec<ScoredHit>) -> Dispersed {
        if hits.is_empty() {
            return Dispersed {
                hits,
                cells_used: 0,
                geo_hits: 0,
                non_geo_hits: 0,
            };
        }

        let mut geo: Vec<(GeoPoint, ScoredHit)> = Vec::new();
        let mut non_geo: Vec<ScoredHit> = Vec::new();
        for hit in hits {
            match GeoPoint::from_document(&hit.doc) {
                Some(point) => geo.push((point, hit)),
                None => non_geo.push(hit),
            }
        }

        if geo.is_empty() {
            let total = non_geo.len();
            debug!("no usable coordinates in result set, skipping dispersion");
            return Dispersed {
                hits: non_geo,
                cells_used: 0,
                geo_hits: 0,
                non_geo_hits: total,
            };
        }

        let geo_count = geo.len();
        let non_geo_count = non_geo.len();

        // BTreeMap keeps cell keys in lexicographic order.
        let mut cells: BTreeMap<String, Vec<(GeoPoint, ScoredHit)>> = BTreeMap::new();
        for (point, hit) in geo {
            cells.entry(self.cell_key(&point)).or_default().push((point, hit));
        }
        let cells_used = cells.len();

        let mut cell_lists: Vec<Vec<(GeoPoint, ScoredHit)>> = cells.into_values().collect();
        for cell in &mut cell_lists {
            cell.sort_by(|(pa, a), (pb, b)| {
                hit_id(a)
                    .cmp(&hit_id(b))
                    .then_with(|| a.doc.display_name().cmp(b.doc.display_name()))
                    .then_with(|| pa.lat.total_cmp(&pb.lat))
                    .then_with(|| pa.lng.total_cmp(&pb.lng))
            });
        }

        let max_items = cell_lists.iter().map(Vec::len).max().unwrap_or(0);
        let mut dispersed = Vec::with_capacity(geo_count + non_geo_count);
        let mut rounds: Vec<_> = cell_lists.into_iter().map(Vec::into_iter).collect();
        for _ in 0..max_items {
            for cell in &mut rounds {
                if let Some((_, hit)) = cell.next() {
                    dispersed.push(hit);
                }
            }
        }

        dispersed.extend(non_geo);

        debug!(
            cells = cells_used,
            geo = geo_count,
            non_geo = non_geo_count,
            "dispersed results over grid"
        );

        Dispersed {
            hits: dispersed,
            cells_used,
            geo_hits: geo_count,
            non_geo_hits: non_geo_count,
        }
    }
}

fn hit_id(hit: &ScoredHit) -> String {
    match &hit.doc.id {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
