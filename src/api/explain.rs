use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{ExplainRequest, ExplainResponse};
use crate::state::AppState;

const MAX_TOPIC_LEN: usize = 2000;

/// POST /api/explain - Grounded explanation of a topic from one collection.
///
/// Pipeline failures come back as the answer text, not as HTTP errors.
pub async fn explain(
    State(state): State<AppState>,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>, (StatusCode, String)> {
    let topic = req.topic.trim().to_string();
    if topic.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Topic is required".to_string()));
    }
    if topic.chars().count() > MAX_TOPIC_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Topic exceeds {MAX_TOPIC_LEN} characters"),
        ));
    }

    let _permit = state
        .explain_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Explanation service at capacity".to_string(),
            )
        })?;

    let answer = state
        .answers
        .explain_topic(&topic, &req.collection, req.use_multi_query)
        .await;

    Ok(Json(ExplainResponse { topic, answer }))
}
