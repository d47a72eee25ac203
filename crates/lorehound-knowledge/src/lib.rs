//! # Lorehound Knowledge
//!
//! In-memory semantic retrieval over embedded text chunks.
//!
//! ## Design
//! - **EmbeddingStore** — insertion-ordered chunks keyed by id; the first
//!   append fixes the vector dimensionality for the store's lifetime
//! - **VectorBackend** — cosine similarity over the whole corpus, either
//!   SIMD-accelerated (AVX2/SSE2/NEON) or a portable scalar loop
//! - **Backend selection** — the CPU is probed once per process; a failed
//!   probe silently falls back to the portable backend
//! - **SemanticRetriever** — embeds the query via the configured provider,
//!   scores every chunk, and returns a ranked, capped result list
//!
//! ## How it works
//! ```text
//! documents → chunker → (embedding provider) → EmbeddingStore
//!   ↓ query
//! SemanticRetriever.retrieve(query, top_k)
//!   ↓ cosine scores (accelerated or portable)
//! ranked ScoredResults, ties broken by insertion order
//! ```

pub mod backend;
pub mod chunker;
pub mod retriever;
pub mod simd;
pub mod store;

pub use backend::{AcceleratedBackend, BackendKind, PortableBackend, VectorBackend};
pub use retriever::{ScoredResult, SemanticRetriever};
pub use store::{Chunk, EmbeddingStore};
