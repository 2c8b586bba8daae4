//! Document store abstraction and the chunk adapter the retriever uses.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{Chunk, CollectionSummary, StoreHit, StoreRecord};

/// A persistent set of named collections with embedding-based text search.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace records by id. Returns the number written.
    async fn upsert(&self, collection: &str, records: Vec<StoreRecord>) -> Result<usize>;

    /// Nearest-neighbour text query, best match first.
    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<StoreHit>>;

    /// Returns false when the collection did not exist.
    async fn delete_collection(&self, collection: &str) -> Result<bool>;

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>>;
}

/// Reshapes store hits into [`Chunk`]s. Store failures never escape it.
#[derive(Clone)]
pub struct ChunkStore {
    store: Arc<dyn DocumentStore>,
}

impl ChunkStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Top `n` chunks for `query`, never containing empty content. A
    /// failing store is logged and yields an empty list, so one bad
    /// variant cannot abort a multi-query retrieval.
    pub async fn get_chunks(&self, query: &str, collection: &str, n: usize) -> Vec<Chunk> {
        tracing::info!("Getting chunks for '{query}' from {collection}");
        match self.store.query(collection, query, n.max(1)).await {
            Ok(hits) => hits
                .into_iter()
                .filter(|hit| !hit.document.trim().is_empty())
                .map(|hit| Chunk::new(hit.document, hit.metadata))
                .collect(),
            Err(e) => {
                tracing::error!("Error retrieving chunks from {collection}: {e:#}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use parking_lot::Mutex;
    use serde_json::json;

    struct FixedStore {
        hits: Vec<(&'static str, &'static str)>,
        fail: bool,
        last_k: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl DocumentStore for FixedStore {
        async fn upsert(&self, _collection: &str, records: Vec<StoreRecord>) -> Result<usize> {
            Ok(records.len())
        }

        async fn query(&self, _collection: &str, _text: &str, k: usize) -> Result<Vec<StoreHit>> {
            *self.last_k.lock() = Some(k);
            if self.fail {
                anyhow::bail!("collection is locked");
            }
            Ok(self
                .hits
                .iter()
                .take(k)
                .map(|(doc, source)| {
                    let mut metadata = Metadata::new();
                    metadata.insert("source".into(), json!(source));
                    StoreHit {
                        document: doc.to_string(),
                        metadata,
                    }
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

    fn store(hits: Vec<(&'static str, &'static str)>, fail: bool) -> Arc<FixedStore> {
        Arc::new(FixedStore {
            hits,
            fail,
            last_k: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_get_chunks_drops_empty_documents() {
        let chunks = ChunkStore::new(store(
            vec![("Cells divide.", "bio.pdf"), ("", "bio.pdf"), ("  ", "bio.pdf")],
            false,
        ));
        let result = chunks.get_chunks("cell division", "biology", 5).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].content, "Cells divide.");
        assert_eq!(result[0].source(), Some("bio.pdf"));
    }

    #[tokio::test]
    async fn test_get_chunks_swallows_store_failure() {
        let chunks = ChunkStore::new(store(vec![("Cells divide.", "bio.pdf")], true));
        assert!(chunks.get_chunks("cells", "biology", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_chunks_requests_at_least_one() {
        let backing = store(vec![("Cells divide.", "bio.pdf")], false);
        let chunks = ChunkStore::new(backing.clone());
        let result = chunks.get_chunks("cells", "biology", 0).await;
        assert_eq!(result.len(), 1);
        assert_eq!(*backing.last_k.lock(), Some(1));
    }
}
