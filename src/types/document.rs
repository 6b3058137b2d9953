use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A candidate document as returned by the index backend.
///
/// Scoring only reads the well-known attributes modelled as typed fields;
/// everything else lands in `extra` and is serialized back verbatim. The
/// pipeline never mutates a document - scoring annotations live on
/// [`super::response::ScoredHit`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_etab: Option<Value>,

    /// Canonical display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Legacy display name used by older indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,

    /// Pre-cleaned, tokenized name (lowercased, diacritics removed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_search: Option<String>,

    /// Space-collapsed variant of the cleaned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_no_space: Option<String>,

    /// Pre-computed phonetic tokens, space separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_soundex: Option<String>,

    /// Department code; integer-coercible when usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dep: Option<Value>,

    #[serde(rename = "_geo", default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<Value>,

    /// Pass-through fields the scorer does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `_geo` object on geo-enabled indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Display name: `name`, falling back to `nom`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.nom.as_deref())
            .unwrap_or_default()
    }

    /// Identity key used for deduplication and as the final sort tie-break:
    /// `id`, else `id_etab`, else the first 200 characters of the display
    /// name. Documents without any of the three collapse onto the empty key.
    pub fn dedup_key(&self) -> String {
        if let Some(id) = self.id.as_ref().and_then(value_as_key) {
            return id;
        }
        if let Some(id) = self.id_etab.as_ref().and_then(value_as_key) {
            return id;
        }
        self.display_name().chars().take(200).collect()
    }

    /// Identity as an integer, when coercible. Used by enrichment lookups.
    pub fn numeric_id(&self) -> Option<i64> {
        self.id
            .as_ref()
            .and_then(value_as_i64)
            .or_else(|| self.id_etab.as_ref().and_then(value_as_i64))
    }

    /// Department code as an integer, when coercible.
    pub fn dep_code(&self) -> Option<i64> {
        self.dep.as_ref().and_then(value_as_i64)
    }
}

fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integer coercion for identifier-like values: JSON numbers and numeric
/// strings are accepted, everything else is ignored.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Float coercion for coordinate values.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
