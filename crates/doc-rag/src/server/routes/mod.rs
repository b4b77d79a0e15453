//! API routes for the RAG server

pub mod documents;
pub mod query;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use crate::server::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(info))
        // Upload - body limit slightly above the file limit so oversize files get a clear 400
        .route(
            "/upload",
            post(upload::upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size.saturating_add(MULTIPART_OVERHEAD))),
        )
        .route("/query", post(query::query_documents))
        .route("/documents", get(documents::list_documents))
        .route("/stats", get(documents::collection_stats))
        .route("/reset", delete(documents::reset_collection))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "message": "Document Intelligence RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/upload",
            "query": "/query",
            "documents": "/documents",
            "stats": "/stats",
            "reset": "/reset",
            "health": "/health",
            "ready": "/ready"
        }
    }))
}
