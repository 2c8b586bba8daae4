use std::sync::Arc;

use super::prompts::{explanation_prompt, NO_INFORMATION_ANSWER};
use super::{GenerateOptions, LanguageModel};
use crate::error::AnswerError;
use crate::search::context::ContextAssembler;

/// Low-variance sampling for grounded explanations.
const EXPLAIN_OPTIONS: GenerateOptions = GenerateOptions {
    temperature: 0.2,
    top_p: Some(0.5),
    top_k: Some(10),
};

/// Answers a topic from a collection. Always returns text: failures are
/// rendered as user-facing messages.
pub struct AnswerService {
    context: Arc<ContextAssembler>,
    llm: Arc<dyn LanguageModel>,
}

impl AnswerService {
    pub fn new(context: Arc<ContextAssembler>, llm: Arc<dyn LanguageModel>) -> Self {
        Self { context, llm }
    }

    pub async fn explain_topic(
        &self,
        topic: &str,
        collection: &str,
        use_multi_query: bool,
    ) -> String {
        match self.try_explain(topic, collection, use_multi_query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Explanation for '{topic}' failed: {e}");
                e.user_message()
            }
        }
    }

    async fn try_explain(
        &self,
        topic: &str,
        collection: &str,
        use_multi_query: bool,
    ) -> Result<String, AnswerError> {
        let context = self
            .context
            .get_explanation_context(topic, collection, use_multi_query)
            .await?;

        if context.is_empty() {
            return Ok(NO_INFORMATION_ANSWER.to_string());
        }

        let prompt = explanation_prompt(topic, &context);
        let answer = self
            .llm
            .generate(&prompt, &EXPLAIN_OPTIONS)
            .await
            .map_err(|e| AnswerError::Generation(format!("{e:#}")))?;

        if answer.trim().is_empty() {
            return Err(AnswerError::Unexpected(
                "the model returned an empty response".to_string(),
            ));
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::llm::query_expand::QueryExpander;
    use crate::llm::Embedder;
    use crate::models::{CollectionSummary, Metadata, StoreHit, StoreRecord};
    use crate::search::multi_query::MultiQueryRetriever;
    use crate::search::store::{ChunkStore, DocumentStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records every prompt; replies with `reply`, or fails when it is `None`.
    struct RecordingModel {
        reply: Option<&'static str>,
        prompts: Mutex<Vec<(String, GenerateOptions)>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
            self.prompts.lock().push((prompt.to_string(), *options));
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => anyhow::bail!("model server returned 500"),
            }
        }
    }

    struct DocsStore(Vec<&'static str>);

    #[async_trait]
    impl DocumentStore for DocsStore {
        async fn upsert(&self, _collection: &str, records: Vec<StoreRecord>) -> Result<usize> {
            Ok(records.len())
        }

        async fn query(&self, _collection: &str, _text: &str, k: usize) -> Result<Vec<StoreHit>> {
            Ok(self
                .0
                .iter()
                .take(k)
                .map(|doc| StoreHit {
                    document: doc.to_string(),
                    metadata: Metadata::new(),
                })
                .collect())
        }

        async fn delete_collection(&self, _collection: &str) -> Result<bool> {
            Ok(false)
        }

        async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
            Ok(Vec::new())
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
    }

    fn service(
        docs: Vec<&'static str>,
        reply: Option<&'static str>,
    ) -> (AnswerService, Arc<RecordingModel>) {
        let model = Arc::new(RecordingModel {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let chunks = ChunkStore::new(Arc::new(DocsStore(docs)));
        let retriever = Arc::new(MultiQueryRetriever::new(
            Arc::new(QueryExpander::new(model.clone(), 3, 0.1)),
            chunks.clone(),
            Arc::new(UnitEmbedder),
            60,
        ));
        let context = Arc::new(ContextAssembler::new(
            retriever,
            chunks,
            RetrievalConfig::default(),
        ));
        (AnswerService::new(context, model.clone()), model)
    }

    #[tokio::test]
    async fn test_no_context_skips_generation() {
        let (service, model) = service(Vec::new(), Some("should not be used"));
        let answer = service.explain_topic("osmosis", "biology", false).await;
        assert_eq!(answer, NO_INFORMATION_ANSWER);
        assert!(model.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_no_context_with_variants_only_expands() {
        let (service, model) = service(
            Vec::new(),
            Some("How does water move?\nWhy do cells swell?"),
        );
        let answer = service.explain_topic("osmosis", "biology", true).await;
        assert_eq!(answer, NO_INFORMATION_ANSWER);

        let prompts = model.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Original question: osmosis"));
    }

    #[tokio::test]
    async fn test_explanation_uses_context_and_fixed_options() {
        let (service, model) = service(
            vec!["Water diffuses through a semi-permeable membrane."],
            Some("Osmosis is the movement of water."),
        );
        let answer = service.explain_topic("osmosis", "biology", false).await;
        assert_eq!(answer, "Osmosis is the movement of water.");

        let prompts = model.prompts.lock();
        assert_eq!(prompts.len(), 1);
        let (prompt, options) = &prompts[0];
        assert!(prompt.contains("explanation about: osmosis"));
        assert!(prompt.contains("[1] (similarity: 0.000)\nWater diffuses"));
        assert_eq!(*options, EXPLAIN_OPTIONS);
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_message() {
        let (service, _) = service(vec!["Some context."], None);
        let answer = service.explain_topic("osmosis", "biology", false).await;
        assert!(answer.starts_with("I encountered an issue generating an explanation: "));
        assert!(answer.contains("500"));
    }

    #[tokio::test]
    async fn test_empty_model_answer_is_unexpected() {
        let (service, _) = service(vec!["Some context."], Some("  "));
        let answer = service.explain_topic("osmosis", "biology", false).await;
        assert!(answer.starts_with("An unexpected error occurred: "));
    }

    #[tokio::test]
    async fn test_invalid_collection_becomes_context_message() {
        let (service, model) = service(vec!["Some context."], Some("unused"));
        let answer = service.explain_topic("osmosis", "x", true).await;
        assert!(answer.starts_with("I encountered an issue retrieving information: "));
        assert!(model.prompts.lock().is_empty());
    }
}
