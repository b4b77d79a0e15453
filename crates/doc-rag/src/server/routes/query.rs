//! Query endpoint with RAG and citations

use axum::{extract::State, http::StatusCode, Json};

use crate::server::state::AppState;
use crate::types::{QueryOutcome, QueryRequest};

/// POST /query - Answer a question over the uploaded documents
pub async fn query_documents(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<QueryOutcome>) {
    tracing::info!("Query: \"{}\"", request.question);

    let outcome = state
        .rag()
        .query(&request.question, request.effective_filter())
        .await;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}
