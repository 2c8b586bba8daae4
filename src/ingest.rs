//! Document ingestion: extract text, split, and write chunks to a collection.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::chunking::{clean_text, validate_collection_name, TextSplitter};
use crate::models::{IngestReport, Metadata, StoreRecord};
use crate::search::store::DocumentStore;

/// How the uploaded bytes should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("application/pdf") => DocumentKind::Pdf,
            _ => DocumentKind::Text,
        }
    }
}

pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    splitter: TextSplitter,
}

impl Ingestor {
    pub fn new(store: Arc<dyn DocumentStore>, splitter: TextSplitter) -> Self {
        Self { store, splitter }
    }

    pub async fn ingest(
        &self,
        collection: &str,
        source: &str,
        bytes: Vec<u8>,
        kind: DocumentKind,
        reset: bool,
    ) -> Result<IngestReport> {
        if !validate_collection_name(collection) {
            anyhow::bail!("Invalid collection name: {collection}");
        }

        let text = match kind {
            DocumentKind::Pdf => tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes)
            })
            .await
            .context("PDF extraction task failed")?
            .map_err(|e| anyhow::anyhow!("Failed to extract text from {source}: {e}"))?,
            DocumentKind::Text => String::from_utf8_lossy(&bytes).into_owned(),
        };

        let records = self.build_records(&text, source);
        if records.is_empty() {
            anyhow::bail!("Document {source} contains no text");
        }

        if reset && self.store.delete_collection(collection).await? {
            tracing::info!("Reset collection {collection}");
        }

        let chunks = self
            .store
            .upsert(collection, records)
            .await
            .with_context(|| format!("Failed to store chunks in {collection}"))?;

        tracing::info!("Ingested {source} into {collection}: {chunks} chunks");
        Ok(IngestReport {
            collection: collection.to_string(),
            source: source.to_string(),
            chunks,
        })
    }

    fn build_records(&self, text: &str, source: &str) -> Vec<StoreRecord> {
        let stem = Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(source);

        self.splitter
            .split(text)
            .iter()
            .map(|piece| clean_text(piece))
            .filter(|piece| !piece.is_empty())
            .enumerate()
            .map(|(i, piece)| {
                let mut metadata = Metadata::new();
                metadata.insert("source".into(), json!(source));
                metadata.insert("chunk_index".into(), json!(i));
                StoreRecord {
                    id: format!("chunk_{i}_{stem}"),
                    text: piece,
                    metadata,
                }
            })
            .collect()
    }
}
