use futures_util::future::join_all;
use serde_json::json;
use std::sync::Arc;

use super::fusion::{hybrid_rank, RankParams};
use super::store::ChunkStore;
use crate::llm::query_expand::QueryExpander;
use crate::llm::Embedder;
use crate::models::Chunk;

/// Per-call retrieval knobs.
#[derive(Debug, Clone, Copy)]
pub struct RetrieveOptions {
    pub chunks_per_query: usize,
    pub max_chunks: usize,
    pub deduplicate: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            chunks_per_query: 3,
            max_chunks: 5,
            deduplicate: true,
        }
    }
}

/// Expands a question, retrieves for every phrasing and fuses the lists.
pub struct MultiQueryRetriever {
    expander: Arc<QueryExpander>,
    chunks: ChunkStore,
    embedder: Arc<dyn Embedder>,
    rrf_k: usize,
}

impl MultiQueryRetriever {
    pub fn new(
        expander: Arc<QueryExpander>,
        chunks: ChunkStore,
        embedder: Arc<dyn Embedder>,
        rrf_k: usize,
    ) -> Self {
        Self {
            expander,
            chunks,
            embedder,
            rrf_k,
        }
    }

    pub async fn retrieve(
        &self,
        question: &str,
        collection: &str,
        options: RetrieveOptions,
    ) -> Vec<Chunk> {
        if question.trim().is_empty() {
            return Vec::new();
        }

        let variants = self.expander.expand(question).await;
        tracing::info!("Retrieving for {} query variants from {collection}", variants.len());

        // join_all yields in input order, so fusion sees the same lists as a
        // sequential loop would produce.
        let lists: Vec<Vec<Chunk>> = join_all(variants.iter().map(|variant| async move {
            let mut found = self
                .chunks
                .get_chunks(variant, collection, options.chunks_per_query)
                .await;
            for chunk in &mut found {
                chunk.metadata.insert("query".into(), json!(variant));
            }
            found
        }))
        .await;

        let params = RankParams {
            rrf_k: self.rrf_k,
            max_chunks: options.max_chunks,
            deduplicate: options.deduplicate,
        };
        let ranked = hybrid_rank(self.embedder.as_ref(), &lists, question, &params).await;

        tracing::info!("Ranked {} chunks for question", ranked.len());
        ranked
    }
}
