pub mod document;
pub mod query;
pub mod response;

pub use document::{Document, GeoField};
pub use query::{QueryData, QueryInput, SearchOptions, SearchRequest};
pub use response::{MatchMethod, MatchType, ScoredHit, SearchResponse, Strategy};
