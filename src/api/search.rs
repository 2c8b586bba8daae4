use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::AnswerError;
use crate::models::{RetrieveRequest, RetrieveResponse};
use crate::state::AppState;

/// POST /api/retrieve - Ranked chunks for a query, without generation
pub async fn retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }

    let max_chunks = req
        .max_chunks
        .unwrap_or(state.config.retrieval.max_ranked_chunks);

    let chunks = state
        .context
        .retrieve(&query, &req.collection, Some(max_chunks), req.use_multi_query)
        .await
        .map_err(|e| match e {
            AnswerError::Context(msg) => (StatusCode::BAD_REQUEST, msg),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    Ok(Json(RetrieveResponse { query, chunks }))
}
