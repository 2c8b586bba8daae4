use std::sync::Arc;

use crate::chunking::TextSplitter;
use crate::config::Config;
use crate::ingest::Ingestor;
use crate::llm::client::LlmClient;
use crate::llm::explain::AnswerService;
use crate::llm::query_expand::QueryExpander;
use crate::llm::{Embedder, LanguageModel};
use crate::search::context::ContextAssembler;
use crate::search::multi_query::MultiQueryRetriever;
use crate::search::store::{ChunkStore, DocumentStore};
use crate::search::vector::VectorStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub ingestor: Arc<Ingestor>,
    pub context: Arc<ContextAssembler>,
    pub answers: Arc<AnswerService>,
    pub explain_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    /// Build the pipeline against the configured model server.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Arc::new(LlmClient::new(config.llm.clone())?);
        Self::with_backends(config, client.clone(), client)
    }

    /// Wire every component explicitly from the given collaborators.
    pub fn with_backends(
        config: Config,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
    ) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(VectorStore::open_or_create(
            &config.collections_dir(),
            embedder.clone(),
        )?);
        let chunks = ChunkStore::new(store.clone());

        let expander = Arc::new(QueryExpander::new(
            llm.clone(),
            config.retrieval.max_query_variants,
            config.llm.temperature,
        ));
        let retriever = Arc::new(MultiQueryRetriever::new(
            expander,
            chunks.clone(),
            embedder,
            config.retrieval.rrf_k,
        ));
        let context = Arc::new(ContextAssembler::new(
            retriever,
            chunks,
            config.retrieval.clone(),
        ));
        let answers = Arc::new(AnswerService::new(context.clone(), llm));
        let ingestor = Arc::new(Ingestor::new(
            store.clone(),
            TextSplitter::from_config(&config.chunking),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            ingestor,
            context,
            answers,
            explain_semaphore: Arc::new(tokio::sync::Semaphore::new(3)),
        })
    }
}
