//! # rag-tutor
//!
//! A retrieval-augmented tutoring service. Documents are split into chunks
//! and stored in named collections; questions are answered from the chunks
//! most relevant to them using a multi-query retrieval pipeline.
//!
//! ## Architecture
//!
//! The answer pipeline is a directed acyclic graph (DAG):
//!
//! ```text
//!                     ┌──────────────┐
//!                     │ User Question│
//!                     └──────┬───────┘
//!                            │
//!                            ▼
//!                 ┌─────────────────────┐
//!                 │   Query Expansion   │
//!                 │ (LLM, 1 call, <= 3  │
//!                 │  variants, original │
//!                 │  question first)    │
//!                 └──────────┬──────────┘
//!                            │ N variants
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//!   │  Variant 1  │   │  Variant 2  │   │  Variant 3  │
//!   │ top-k chunks│   │ top-k chunks│   │ top-k chunks│
//!   └──────┬──────┘   └──────┬──────┘   └──────┬──────┘
//!          │                 │                 │
//!          └─────────────────┼─────────────────┘
//!                            │ N ranked lists
//!                            ▼
//!                ┌───────────────────────┐
//!                │  Reciprocal Rank      │
//!                │  Fusion (k = 60),     │
//!                │  dedup by content     │
//!                └───────────┬───────────┘
//!                            │
//!                            ▼
//!                ┌───────────────────────┐
//!                │  Similarity Boost     │
//!                │  dot(query, chunk)    │
//!                │  re-sort, keep top M  │
//!                └───────────┬───────────┘
//!                            │
//!                            ▼
//!                ┌───────────────────────┐
//!                │  Context Assembly     │
//!                │  [rank] (similarity)  │
//!                └───────────┬───────────┘
//!                            │
//!                            ▼
//!                ┌───────────────────────┐
//!                │  Grounded Explanation │
//!                │  (LLM, low variance)  │
//!                └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, storage, LLM and retrieval knobs
//! - [`models`] - Shared data types: `Chunk`, store records, request/response types
//! - [`error`] - Answer-level failure categories and their user-facing messages
//! - [`chunking`] - Whitespace cleanup, collection-name rules, recursive text splitter
//! - [`ingest`] - PDF/text extraction and chunk upload into a collection
//! - [`search::store`] - `DocumentStore` trait and the failure-absorbing `ChunkStore` adapter
//! - [`search::vector`] - In-memory vector store with cosine similarity and disk persistence
//! - [`search::fusion`] - Reciprocal Rank Fusion, similarity boost and `hybrid_rank`
//! - [`search::multi_query`] - Concurrent per-variant retrieval feeding `hybrid_rank`
//! - [`search::context`] - Context block assembly for explanation prompts
//! - [`llm::client`] - Generation and embeddings via Ollama or OpenAI-compatible APIs
//! - [`llm::query_expand`] - LLM-powered query expansion and variant parsing
//! - [`llm::explain`] - Topic explanations with categorized failure messages
//! - [`api`] - Axum HTTP handlers for collections, retrieval, explanations and config
//! - [`state`] - Shared application state wiring every component explicitly

pub mod api;
pub mod chunking;
pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
