//! Language-model and embedding collaborators.
//!
//! The retrieval core only sees the [`LanguageModel`] and [`Embedder`]
//! traits; [`client::LlmClient`] implements both over HTTP for Ollama and
//! OpenAI-compatible servers.

pub mod client;
pub mod embeddings;
pub mod explain;
pub mod prompts;
pub mod query_expand;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use crate::config::LlmConfig;

/// Wire format spoken by the configured model server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl Provider {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.provider.as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
    }

    /// Texts per embedding request.
    pub fn embed_batch_size(self) -> usize {
        match self {
            Provider::Ollama => 32,
            Provider::OpenAi => 64,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => f.write_str("Ollama"),
            Provider::OpenAi => f.write_str("OpenAI"),
        }
    }
}

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl GenerateOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            top_p: None,
            top_k: None,
        }
    }
}

/// Blocking-style text generation: one prompt in, one full response out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;
}

/// Text embedding. Vectors have a fixed length and unit norm.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
