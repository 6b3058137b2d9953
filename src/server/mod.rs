//! HTTP surface of the search service.
//!
//! One JSON endpoint, `POST /search`, plus health/status probes. Pipeline
//! failures map to 500 with a JSON error body; scoring itself never panics,
//! so anything else coming out of the handler is a backend or enrichment
//! failure.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::search::SearchService;
use crate::types::SearchRequest;

#[derive(Clone)]
struct AppState {
    service: Arc<SearchService>,
}

/// HTTP server wrapping a [`SearchService`].
pub struct ApiServer {
    host: String,
    port: u16,
    service: Arc<SearchService>,
}

impl ApiServer {
    pub fn new(host: String, port: u16, service: Arc<SearchService>) -> Self {
        Self {
            host,
            port,
            service,
        }
    }

    pub async fn serve(&self) -> Result<()> {
        let app = router(Arc::clone(&self.service));

        let addr: SocketAddr = format!("{}:{}", self.host, self.port).parse()?;
        info!("search API listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the router; separated from [`ApiServer`] so tests can drive the
/// handlers without binding a socket.
pub fn router(service: Arc<SearchService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/search", post(search))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "resto-search API is running"
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "resto-search"
    }))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    info!(index = %request.index_name, "search request received");

    match state
        .service
        .search(
            &request.index_name,
            request.query_data.as_ref(),
            &request.options,
            request.user_id,
        )
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("search request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
