use serde_json::json;
use std::collections::HashMap;

use crate::llm::Embedder;
use crate::models::Chunk;

/// Ranking knobs for one [`hybrid_rank`] call.
#[derive(Debug, Clone, Copy)]
pub struct RankParams {
    /// RRF constant
    pub rrf_k: usize,
    pub max_chunks: usize,
    pub deduplicate: bool,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            rrf_k: 60,
            max_chunks: 5,
            deduplicate: true,
        }
    }
}

/// Reciprocal rank fusion over per-variant result lists.
///
/// Each chunk at zero-based rank `r` in a list contributes `1 / (r + k)` to
/// its cumulative score, keyed by content. Results come back best first;
/// equal scores keep the order in which chunks were first seen. With
/// `deduplicate` off, every list entry is scored on its own.
pub fn reciprocal_rank_fusion(lists: &[Vec<Chunk>], k: usize, deduplicate: bool) -> Vec<Chunk> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<(Chunk, f64)> = Vec::new();

    for list in lists {
        for (rank, chunk) in list.iter().enumerate() {
            if chunk.content.is_empty() {
                continue;
            }
            let score = 1.0 / (rank + k) as f64;

            let existing = if deduplicate {
                slots.get(&chunk.content).copied()
            } else {
                None
            };

            match existing {
                Some(slot) => fused[slot].1 += score,
                None => {
                    if deduplicate {
                        slots.insert(chunk.content.clone(), fused.len());
                    }
                    fused.push((chunk.clone(), score));
                }
            }
        }
    }

    // Vec::sort_by is stable, ties stay in first-seen order
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!("RRF fused {} lists into {} chunks", lists.len(), fused.len());
    fused.into_iter().map(|(chunk, _)| chunk).collect()
}

/// Re-sort chunks by dot-product similarity to `query`, recording the score
/// as `similarity_score` metadata. All or nothing: if any embedding fails
/// the input comes back untouched.
pub async fn semantic_similarity_boost(
    embedder: &dyn Embedder,
    chunks: Vec<Chunk>,
    query: &str,
) -> Vec<Chunk> {
    if chunks.is_empty() {
        return chunks;
    }

    let query_embedding = match embedder.embed(query).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Error embedding query for similarity boost: {e:#}");
            return chunks;
        }
    };

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let chunk_embeddings = match embedder.embed_batch(&texts).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Error embedding chunks for similarity boost: {e:#}");
            return chunks;
        }
    };

    if chunk_embeddings.len() != chunks.len()
        || chunk_embeddings
            .iter()
            .any(|e| e.len() != query_embedding.len())
    {
        tracing::error!("Embedding shape mismatch during similarity boost, keeping fused order");
        return chunks;
    }

    let mut scored: Vec<(Chunk, f64)> = chunks
        .into_iter()
        .zip(chunk_embeddings)
        .map(|(mut chunk, embedding)| {
            let similarity = dot(&query_embedding, &embedding);
            chunk
                .metadata
                .insert("similarity_score".into(), json!(similarity));
            (chunk, similarity)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(chunk, _)| chunk).collect()
}

/// RRF, then similarity boost, then cut to `params.max_chunks`.
pub async fn hybrid_rank(
    embedder: &dyn Embedder,
    lists: &[Vec<Chunk>],
    query: &str,
    params: &RankParams,
) -> Vec<Chunk> {
    let fused = reciprocal_rank_fusion(lists, params.rrf_k, params.deduplicate);
    let mut ranked = semantic_similarity_boost(embedder, fused, query).await;
    ranked.truncate(params.max_chunks);
    ranked
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}
