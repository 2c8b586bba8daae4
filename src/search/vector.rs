use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::store::DocumentStore;
use crate::chunking::validate_collection_name;
use crate::llm::Embedder;
use crate::models::{CollectionSummary, Metadata, StoreHit, StoreRecord};

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    id: String,
    text: String,
    metadata: Metadata,
    embedding: Vec<f32>,
    stored_at: DateTime<Utc>,
}

/// In-memory vector store with per-collection disk persistence and cosine
/// similarity search. Collection embeddings come from the injected embedder.
pub struct VectorStore {
    collections: RwLock<BTreeMap<String, Vec<VectorEntry>>>,
    persist_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl VectorStore {
    pub fn open_or_create(persist_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        std::fs::create_dir_all(persist_dir)?;

        let mut collections = BTreeMap::new();
        for entry in std::fs::read_dir(persist_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !validate_collection_name(name) {
                tracing::warn!("Skipping collection file with invalid name {}", path.display());
                continue;
            }
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read collection {}", path.display()))?;
            match serde_json::from_str::<Vec<VectorEntry>>(&data) {
                Ok(entries) => {
                    collections.insert(name.to_string(), entries);
                }
                Err(e) => tracing::warn!("Skipping unreadable collection {}: {e}", path.display()),
            }
        }

        tracing::info!("Loaded {} collections from {}", collections.len(), persist_dir.display());

        Ok(Self {
            collections: RwLock::new(collections),
            persist_dir: persist_dir.to_path_buf(),
            embedder,
        })
    }

    pub fn entry_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Only validated names map to a path inside `persist_dir`.
    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        if !validate_collection_name(collection) {
            anyhow::bail!("Invalid collection name: {collection}");
        }
        Ok(self.persist_dir.join(format!("{collection}.json")))
    }

    /// Atomic write via temp file + rename.
    fn persist(&self, collection: &str, entries: &[VectorEntry]) -> Result<()> {
        let data = serde_json::to_string(entries)?;
        let path = self.collection_path(collection)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for VectorStore {
    async fn upsert(&self, collection: &str, records: Vec<StoreRecord>) -> Result<usize> {
        self.collection_path(collection)?;
        if records.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed records")?;
        if embeddings.len() != records.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            );
        }

        let now = Utc::now();
        let mut collections = self.collections.write();
        // Edit a copy; the map only changes once the disk write succeeded.
        let mut entries = collections.get(collection).cloned().unwrap_or_default();

        let written = records.len();
        for (record, embedding) in records.into_iter().zip(embeddings) {
            let entry = VectorEntry {
                id: record.id,
                text: record.text,
                metadata: record.metadata,
                embedding,
                stored_at: now,
            };
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        self.persist(collection, &entries)?;
        collections.insert(collection.to_string(), entries);
        Ok(written)
    }

    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<StoreHit>> {
        self.collection_path(collection)?;
        if self.entry_count(collection) == 0 {
            return Ok(Vec::new());
        }

        // Embed before taking the lock: never hold it across an await.
        let query_embedding = self.embedder.embed(text).await?;

        let collections = self.collections.read();
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&query_embedding, &e.embedding), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(_, e)| StoreHit {
                document: e.text.clone(),
                metadata: e.metadata.clone(),
            })
            .collect())
    }

    async fn delete_collection(&self, collection: &str) -> Result<bool> {
        let path = self.collection_path(collection)?;

        // Guard held until the file is gone: an upsert must not persist
        // between the file removal and the map removal.
        let mut collections = self.collections.write();
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(collections.remove(collection).is_some())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let collections = self.collections.read();
        Ok(collections
            .iter()
            .map(|(name, entries)| CollectionSummary {
                name: name.clone(),
                chunk_count: entries.len(),
                updated_at: entries.iter().map(|e| e.stored_at).max(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
