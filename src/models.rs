use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form chunk metadata. Stages only ever add keys to it.
pub type Metadata = serde_json::Map<String, Value>;

/// A retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Similarity written by the ranking stage, or 0.0 when the chunk was never scored.
    pub fn similarity_score(&self) -> f64 {
        self.metadata
            .get("similarity_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// The query variant that retrieved this chunk, if tagged.
    pub fn query(&self) -> Option<&str> {
        self.metadata.get("query").and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// One record written to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// A raw (document, metadata) pair as returned by a store query.
#[derive(Debug, Clone)]
pub struct StoreHit {
    pub document: String,
    pub metadata: Metadata,
}

/// Collection listing entry
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub chunk_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub source: String,
    pub chunks: usize,
}

/// Query string of the document upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct IngestQuery {
    pub source: Option<String>,
    #[serde(default)]
    pub reset: bool,
}

/// Retrieval-only request
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub collection: String,
    #[serde(default = "default_true")]
    pub use_multi_query: bool,
    pub max_chunks: Option<usize>,
}

/// Retrieval-only response
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    pub query: String,
    pub chunks: Vec<Chunk>,
}

/// Explanation request
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    pub topic: String,
    pub collection: String,
    #[serde(default = "default_true")]
    pub use_multi_query: bool,
}

/// Explanation response
#[derive(Debug, Clone, Serialize)]
pub struct ExplainResponse {
    pub topic: String,
    pub answer: String,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_similarity_score_defaults_to_zero() {
        let chunk = Chunk::new("text", Metadata::new());
        assert_eq!(chunk.similarity_score(), 0.0);
    }

    #[test]
    fn test_similarity_score_reads_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("similarity_score".into(), json!(0.42));
        let chunk = Chunk::new("text", metadata);
        assert!((chunk.similarity_score() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_explain_request_defaults_to_multi_query() {
        let req: ExplainRequest =
            serde_json::from_str(r#"{"topic": "photosynthesis", "collection": "biology"}"#)
                .unwrap();
        assert!(req.use_multi_query);
    }
}
