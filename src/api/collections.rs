use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use crate::chunking::validate_collection_name;
use crate::config::Config;
use crate::ingest::DocumentKind;
use crate::models::{CollectionSummary, IngestQuery, IngestReport};
use crate::state::AppState;

/// GET /api/collections - List collections, sorted by name
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionSummary>>, (StatusCode, String)> {
    state
        .store
        .list_collections()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))
}

/// POST /api/collections/{name}/documents - Ingest the raw request body
pub async fn upload_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<IngestQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestReport>), (StatusCode, String)> {
    if !validate_collection_name(&name) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Invalid collection name '{name}'"),
        ));
    }
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Document body is empty".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let kind = DocumentKind::from_content_type(content_type);
    let source = params.source.unwrap_or_else(|| match kind {
        DocumentKind::Pdf => format!("{name}.pdf"),
        DocumentKind::Text => format!("{name}.txt"),
    });

    let report = state
        .ingestor
        .ingest(&name, &source, body.to_vec(), kind, params.reset)
        .await
        .map_err(|e| {
            tracing::error!("Failed to ingest {source} into {name}: {e:#}");
            (StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}"))
        })?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// DELETE /api/collections/{name} - Remove a collection and its stored chunks
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !validate_collection_name(&name) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Invalid collection name '{name}'"),
        ));
    }

    let removed = state
        .store
        .delete_collection(&name)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    if !removed {
        return Err((StatusCode::NOT_FOUND, "Collection not found".to_string()));
    }
    tracing::info!("Deleted collection {name}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/config - Current configuration, API key omitted
pub async fn get_config(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.as_ref().clone())
}
