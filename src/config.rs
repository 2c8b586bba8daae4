use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where collection data is persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Largest accepted document upload, in MB
    pub max_upload_mb: usize,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Multi-query retrieval and ranking knobs
    pub retrieval: RetrievalConfig,
    /// Document splitting configuration
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for query variants and explanations
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Sampling temperature used for query-variant generation
    pub temperature: f32,
}

/// Read-only knobs consumed by the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks placed into an explanation context.
    pub max_context_chunks: usize,
    /// Reciprocal rank fusion constant.
    pub rrf_k: usize,
    /// Chunks fetched from the store for every query variant.
    pub chunks_per_query: usize,
    /// Upper bound on query variants, original question included.
    pub max_query_variants: usize,
    /// Default cut applied after fusion when the caller gives none.
    pub max_ranked_chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            max_upload_mb: 50,
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "mistral:7b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            temperature: 0.1,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 3,
            rrf_k: 60,
            chunks_per_query: 3,
            max_query_variants: 3,
            max_ranked_chunks: 5,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("RAG_TUTOR_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("RAG_TUTOR_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(v) = parse_env("RAG_TUTOR_MAX_UPLOAD_MB") {
            config.max_upload_mb = v;
        }

        // LLM config
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(t) = parse_env("LLM_TEMPERATURE") {
            config.llm.temperature = t;
        }

        // Retrieval config
        if let Some(v) = parse_env("RAG_TUTOR_MAX_CONTEXT_CHUNKS") {
            config.retrieval.max_context_chunks = v;
        }
        if let Some(v) = parse_env("RAG_TUTOR_RRF_K") {
            config.retrieval.rrf_k = v;
        }
        if let Some(v) = parse_env("RAG_TUTOR_CHUNKS_PER_QUERY") {
            config.retrieval.chunks_per_query = v;
        }
        if let Some(v) = parse_env("RAG_TUTOR_MAX_QUERY_VARIANTS") {
            config.retrieval.max_query_variants = v;
        }
        if let Some(v) = parse_env("RAG_TUTOR_MAX_RANKED_CHUNKS") {
            config.retrieval.max_ranked_chunks = v;
        }

        // Chunking config
        if let Some(v) = parse_env("RAG_TUTOR_CHUNK_SIZE") {
            config.chunking.chunk_size = v;
        }
        if let Some(v) = parse_env("RAG_TUTOR_CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = v;
        }

        config
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }

    /// Upload body limit in bytes; clamps at `usize::MAX` for huge settings.
    pub fn upload_limit_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
