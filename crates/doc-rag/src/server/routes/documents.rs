//! Document listing, statistics and collection reset

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;
use crate::types::{CollectionStats, ResetOutcome, UploadedDocument};

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub documents: Vec<UploadedDocument>,
}

/// GET /documents - List uploaded documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentList> {
    Json(DocumentList {
        documents: state.rag().list_documents().await,
    })
}

/// GET /stats - Collection statistics
pub async fn collection_stats(State(state): State<AppState>) -> Json<CollectionStats> {
    Json(state.rag().stats().await)
}

/// DELETE /reset - Remove every document from the collection
pub async fn reset_collection(State(state): State<AppState>) -> (StatusCode, Json<ResetOutcome>) {
    let outcome = state.rag().reset().await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}
