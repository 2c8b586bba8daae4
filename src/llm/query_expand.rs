use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::prompts::query_variants_prompt;
use super::{GenerateOptions, LanguageModel};

/// Leading enumeration such as `1. `, `2: ` or `3 `.
static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.:]?\s+").expect("valid enumeration regex"));

/// Candidates shorter than this are not real questions.
const MIN_VARIANT_CHARS: usize = 6;

/// Trailing template artifact some local models emit.
const TRAILING_ARTIFACT: &str = "endif";

/// Expands one question into several phrasings with a single model call.
pub struct QueryExpander {
    llm: Arc<dyn LanguageModel>,
    max_variants: usize,
    options: GenerateOptions,
}

impl QueryExpander {
    pub fn new(llm: Arc<dyn LanguageModel>, max_variants: usize, temperature: f32) -> Self {
        Self {
            llm,
            max_variants: max_variants.max(1),
            options: GenerateOptions::with_temperature(temperature),
        }
    }

    /// Return up to `max_variants` phrasings, always led by the original
    /// question. Verbatim echoes of it from the model are dropped. Never
    /// fails: any model error degrades to `[question]`.
    pub async fn expand(&self, question: &str) -> Vec<String> {
        if question.trim().is_empty() {
            return vec![question.to_string()];
        }

        tracing::info!("Generating variants for the original question");
        let raw = match self
            .llm
            .generate(&query_variants_prompt(question), &self.options)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Error generating query variants: {e:#}");
                return vec![question.to_string()];
            }
        };

        let mut variants = parse_variants(&raw);
        variants.retain(|v| v != question);
        variants.insert(0, question.to_string());
        variants.truncate(self.max_variants);

        tracing::debug!("Query variants: {variants:?}");
        variants
    }
}

/// Split raw model output into cleaned candidate phrasings, in output order.
pub fn parse_variants(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(clean_variant)
        .collect()
}

fn clean_variant(line: &str) -> Option<String> {
    let line = ENUMERATION.replace(line, "");
    let mut line = line.trim();
    if let Some(stripped) = line.strip_suffix(TRAILING_ARTIFACT) {
        line = stripped.trim_end();
    }
    if line.chars().count() < MIN_VARIANT_CHARS {
        return None;
    }
    Some(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerateOptions;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => anyhow::bail!("connection refused"),
            }
        }
    }

    #[test]
    fn test_parse_strips_enumeration() {
        let raw = "1. What does the mitochondria do?\n2: How do cells make energy?\n3 Why is ATP important?";
        assert_eq!(
            parse_variants(raw),
            vec![
                "What does the mitochondria do?",
                "How do cells make energy?",
                "Why is ATP important?",
            ]
        );
    }

    #[test]
    fn test_parse_drops_blank_and_short_lines() {
        let raw = "\n\n   \nok\n1. Why?\nWhat is a cell membrane?\n";
        assert_eq!(parse_variants(raw), vec!["What is a cell membrane?"]);
    }

    #[test]
    fn test_parse_strips_trailing_endif() {
        let raw = "How is glucose broken down? endif";
        assert_eq!(parse_variants(raw), vec!["How is glucose broken down?"]);
    }

    #[test]
    fn test_parse_keeps_numbers_inside_text() {
        let raw = "What happened in 1857?";
        assert_eq!(parse_variants(raw), vec!["What happened in 1857?"]);
    }

    #[test]
    fn test_parse_unicode_lines() {
        let raw = "1. 光合作用是什么意思\n2. 光合作用";
        // second line is only four characters
        assert_eq!(parse_variants(raw), vec!["光合作用是什么意思"]);
    }

    #[tokio::test]
    async fn test_expand_puts_original_first_and_caps() {
        let model = ScriptedModel::replying(
            "1. How do plants make food?\n2. What is the role of chlorophyll?\n3. Where does photosynthesis happen?",
        );
        let expander = QueryExpander::new(model.clone(), 3, 0.1);
        let variants = expander.expand("What is photosynthesis?").await;
        assert_eq!(
            variants,
            vec![
                "What is photosynthesis?",
                "How do plants make food?",
                "What is the role of chlorophyll?",
            ]
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expand_does_not_duplicate_original() {
        let model = ScriptedModel::replying("How do plants make food?\nWhat is photosynthesis?");
        let expander = QueryExpander::new(model, 3, 0.1);
        let variants = expander.expand("What is photosynthesis?").await;
        assert_eq!(
            variants,
            vec!["What is photosynthesis?", "How do plants make food?"]
        );
    }

    #[tokio::test]
    async fn test_expand_keeps_original_when_model_echoes_it_late() {
        let model = ScriptedModel::replying(
            "1. How do plants make food?\n2. What is the role of chlorophyll?\n3. Where does photosynthesis happen?\n4. What is photosynthesis?",
        );
        let expander = QueryExpander::new(model, 3, 0.1);
        let variants = expander.expand("What is photosynthesis?").await;
        assert_eq!(
            variants,
            vec![
                "What is photosynthesis?",
                "How do plants make food?",
                "What is the role of chlorophyll?",
            ]
        );
    }

    #[tokio::test]
    async fn test_expand_falls_back_to_original_on_failure() {
        let expander = QueryExpander::new(ScriptedModel::failing(), 3, 0.1);
        assert_eq!(expander.expand("What is X?").await, vec!["What is X?"]);
    }

    #[tokio::test]
    async fn test_expand_with_empty_model_output() {
        let expander = QueryExpander::new(ScriptedModel::replying("   \n"), 3, 0.1);
        assert_eq!(expander.expand("What is X?").await, vec!["What is X?"]);
    }

    #[tokio::test]
    async fn test_expand_blank_question_skips_model() {
        let model = ScriptedModel::replying("How do plants make food?");
        let expander = QueryExpander::new(model.clone(), 3, 0.1);
        assert_eq!(expander.expand("  ").await, vec!["  "]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expand_single_variant_budget() {
        let model = ScriptedModel::replying("How do plants make food?");
        let expander = QueryExpander::new(model, 1, 0.1);
        assert_eq!(
            expander.expand("What is photosynthesis?").await,
            vec!["What is photosynthesis?"]
        );
    }
}
