use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::config::LlmConfig;

/// Maximum bytes sent per text to the embedding API.
/// Small embedding models have short contexts; 3 000 bytes of prose stays
/// well under 1 024 tokens.
const MAX_EMBED_CHARS: usize = 3_000;

fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Scale a vector to unit length so that a dot product equals cosine similarity.
/// Zero vectors are returned unchanged.
pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Unit-length embeddings for `texts`, in input order.
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let provider = Provider::from_config(config)?;
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(provider.embed_batch_size()) {
        let input: Vec<&str> = batch.iter().map(|t| truncate_for_embedding(t)).collect();
        vectors.extend(request_embeddings(client, config, provider, &input).await?);
    }

    if vectors.len() != texts.len() {
        anyhow::bail!(
            "Embedding API returned {} vectors for {} inputs",
            vectors.len(),
            texts.len()
        );
    }

    Ok(vectors.into_iter().map(normalize).collect())
}

pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    embed_batch(client, config, &[text.to_string()])
        .await?
        .into_iter()
        .next()
        .context("No embedding returned")
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    /// Ollama only: clip over-long inputs instead of failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

/// `/api/embed` and `/v1/embeddings` answer with different shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Ollama { embeddings: Vec<Vec<f32>> },
    OpenAi { data: Vec<OpenAiEmbedding> },
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

impl EmbedResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            EmbedResponse::Ollama { embeddings } => embeddings,
            EmbedResponse::OpenAi { data } => data.into_iter().map(|d| d.embedding).collect(),
        }
    }
}

async fn request_embeddings(
    client: &reqwest::Client,
    config: &LlmConfig,
    provider: Provider,
    input: &[&str],
) -> Result<Vec<Vec<f32>>> {
    let request = match provider {
        Provider::Ollama => client
            .post(format!("{}/api/embed", config.base_url))
            .json(&EmbedRequest {
                model: &config.embedding_model,
                input,
                truncate: Some(true),
            }),
        Provider::OpenAi => client
            .post(format!("{}/v1/embeddings", config.base_url))
            .bearer_auth(config.api_key.as_deref().unwrap_or_default())
            .json(&EmbedRequest {
                model: &config.embedding_model,
                input,
                truncate: None,
            }),
    };

    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to call {provider} embed API"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{provider} embed API returned {status}: {body}");
    }

    let body: EmbedResponse = resp
        .json()
        .await
        .with_context(|| format!("Failed to parse {provider} embed response"))?;
    Ok(body.into_vectors())
}
