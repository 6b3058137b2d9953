//! Retrieval orchestration and ranking.

pub mod backend;
pub mod cache;
pub mod pastille;
pub mod ranker;
pub mod service;

pub use backend::{HttpSearchBackend, RetrievalRequest, RetrievalResponse, SearchBackend};
pub use pastille::{ModificationRow, PastilleService, PastilleStore};
pub use ranker::{Ranked, Ranker, StrategyResults};
pub use service::SearchService;
