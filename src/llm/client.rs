//! HTTP client for Ollama and OpenAI-compatible servers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{embeddings, Embedder, GenerateOptions, LanguageModel, Provider};
use crate::config::LlmConfig;

/// Calls a hosted or local model server. Cheap to clone.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        tracing::debug!(
            "Generating with {} (temperature {})",
            self.config.chat_model,
            options.temperature
        );
        match Provider::from_config(&self.config)? {
            Provider::Ollama => call_ollama(&self.http, &self.config, prompt, options).await,
            Provider::OpenAi => call_openai(&self.http, &self.config, prompt, options).await,
        }
    }
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embeddings::embed_single(&self.http, &self.config, text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        embeddings::embed_batch(&self.http, &self.config, texts).await
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
    options: &GenerateOptions,
) -> Result<String> {
    let url = format!("{}/api/generate", config.base_url);

    let req = OllamaGenerateRequest {
        model: &config.chat_model,
        prompt,
        stream: false,
        options: OllamaOptions {
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
        },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama generate API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama generate API returned {status}: {body}");
    }

    let body: OllamaGenerateResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama generate response")?;
    Ok(body.response)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
    options: &GenerateOptions,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    // top_k has no counterpart in the chat completions API
    let req = OpenAiChatRequest {
        model: &config.chat_model,
        messages: vec![OpenAiMessage {
            role: "user",
            content: prompt,
        }],
        temperature: options.temperature,
        top_p: options.top_p,
    };

    let resp = client
        .post(&url)
        .bearer_auth(config.api_key.as_deref().unwrap_or_default())
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_request_omits_unset_sampling() {
        let req = OllamaGenerateRequest {
            model: "mistral:7b",
            prompt: "hi",
            stream: false,
            options: OllamaOptions {
                temperature: 0.1,
                top_p: None,
                top_k: None,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("top_p").is_none());
        assert!(json["options"].get("top_k").is_none());
    }

    #[test]
    fn test_ollama_request_carries_sampling() {
        let req = OllamaGenerateRequest {
            model: "mistral:7b",
            prompt: "hi",
            stream: false,
            options: OllamaOptions {
                temperature: 0.2,
                top_p: Some(0.5),
                top_k: Some(10),
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["options"]["top_k"], 10);
    }

    #[test]
    fn test_openai_response_without_content() {
        let body: OpenAiChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(body.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config).unwrap();
        let err = client
            .generate("hi", &GenerateOptions::with_temperature(0.1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }
}
