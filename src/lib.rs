pub mod config;
pub mod error;
pub mod metrics;
pub mod scoring;
pub mod search;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::SearchError;
pub use search::{HttpSearchBackend, SearchBackend, SearchService};
pub use server::ApiServer;
pub use types::{QueryData, QueryInput, SearchOptions, SearchRequest, SearchResponse};
