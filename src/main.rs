use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use rag_tutor::api;
use rag_tutor::config::Config;
use rag_tutor::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM provider: {} ({}), chat model {}, embedding model {}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.chat_model,
        config.llm.embedding_model
    );

    let state = AppState::new(config.clone())?;
    let upload_limit = config.upload_limit_bytes();

    let app = Router::new()
        .route("/api/collections", get(api::collections::list_collections))
        .route(
            "/api/collections/{name}/documents",
            post(api::collections::upload_document).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/collections/{name}",
            delete(api::collections::delete_collection),
        )
        .route("/api/retrieve", post(api::search::retrieve))
        .route("/api/explain", post(api::explain::explain))
        .route("/api/config", get(api::collections::get_config))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
