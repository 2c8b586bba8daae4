use std::sync::Arc;

use super::multi_query::{MultiQueryRetriever, RetrieveOptions};
use super::store::ChunkStore;
use crate::chunking::validate_collection_name;
use crate::config::RetrievalConfig;
use crate::error::AnswerError;
use crate::models::Chunk;

/// Turns retrieved chunks into the numbered context block handed to the
/// explanation prompt.
pub struct ContextAssembler {
    retriever: Arc<MultiQueryRetriever>,
    chunks: ChunkStore,
    config: RetrievalConfig,
}

impl ContextAssembler {
    pub fn new(
        retriever: Arc<MultiQueryRetriever>,
        chunks: ChunkStore,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            chunks,
            config,
        }
    }

    /// Ranked chunks for `query`, either through multi-query fusion or a
    /// single direct store lookup.
    pub async fn retrieve(
        &self,
        query: &str,
        collection: &str,
        max_chunks: Option<usize>,
        use_multi_query: bool,
    ) -> Result<Vec<Chunk>, AnswerError> {
        if !validate_collection_name(collection) {
            return Err(AnswerError::Context(format!(
                "invalid collection name '{collection}'"
            )));
        }

        let max_chunks = max_chunks.unwrap_or(self.config.max_context_chunks);
        let chunks = if use_multi_query {
            let options = RetrieveOptions {
                chunks_per_query: self.config.chunks_per_query,
                max_chunks,
                deduplicate: true,
            };
            self.retriever.retrieve(query, collection, options).await
        } else {
            self.chunks.get_chunks(query, collection, max_chunks).await
        };
        Ok(chunks)
    }

    /// Empty string when nothing matched.
    pub async fn build_context(
        &self,
        query: &str,
        collection: &str,
        max_chunks: Option<usize>,
        use_multi_query: bool,
    ) -> Result<String, AnswerError> {
        let max_chunks = max_chunks.unwrap_or(self.config.max_context_chunks);
        let chunks = self
            .retrieve(query, collection, Some(max_chunks), use_multi_query)
            .await?;

        if chunks.is_empty() {
            tracing::warn!("No relevant chunks found in {collection}");
            return Ok(String::new());
        }

        Ok(format_context(&chunks, max_chunks))
    }

    pub async fn get_explanation_context(
        &self,
        topic: &str,
        collection: &str,
        use_multi_query: bool,
    ) -> Result<String, AnswerError> {
        self.build_context(
            topic,
            collection,
            Some(self.config.max_context_chunks),
            use_multi_query,
        )
        .await
    }
}

/// `[rank] (similarity: x.xxx)` header over each chunk, blank line between.
pub fn format_context(chunks: &[Chunk], max_chunks: usize) -> String {
    chunks
        .iter()
        .take(max_chunks)
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] (similarity: {:.3})\n{}",
                i + 1,
                chunk.similarity_score(),
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
