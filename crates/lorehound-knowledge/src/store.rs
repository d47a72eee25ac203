//! In-memory embedding store.
//!
//! Chunks are kept in insertion order (the tie-break order for equal scores)
//! and indexed by id for O(1) lookup. The first successful append fixes the
//! vector dimensionality for the store's lifetime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lorehound_core::error::{LorehoundError, Result};

/// A unit of ingested text with its embedding vector.
///
/// Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique, stable for the process lifetime.
    pub id: String,
    /// Originating label, e.g. a file name.
    pub source: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Insertion-ordered chunk storage keyed by id.
#[derive(Default)]
pub struct EmbeddingStore {
    chunks: Vec<Chunk>,
    index: HashMap<String, usize>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    ///
    /// Fails with `DuplicateChunk` when the id is already present, and with
    /// `DimensionMismatch` when the vector's length differs from the store's
    /// established dimensionality. Either failure leaves the store unchanged.
    pub fn append(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<()> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(LorehoundError::DuplicateChunk(id));
        }
        if let Some(expected) = self.dimension()
            && embedding.len() != expected
        {
            return Err(LorehoundError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        self.index.insert(id.clone(), self.chunks.len());
        self.chunks.push(Chunk {
            id,
            source: source.into(),
            content: content.into(),
            embedding,
        });
        Ok(())
    }

    /// Look up a chunk by id.
    pub fn get(&self, id: &str) -> Result<&Chunk> {
        self.index
            .get(id)
            .map(|&i| &self.chunks[i])
            .ok_or_else(|| LorehoundError::ChunkNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// All embedding vectors, index-aligned with [`chunks`](Self::chunks).
    pub fn vectors(&self) -> Vec<&[f32]> {
        self.chunks.iter().map(|c| c.embedding.as_slice()).collect()
    }

    /// The fixed dimensionality, or `None` while the store is empty.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Distinct source labels, in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for c in &self.chunks {
            if !seen.contains(&c.source.as_str()) {
                seen.push(c.source.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut store = EmbeddingStore::new();
        store
            .append("a#0", "a.md", "first paragraph", vec![1.0, 0.0])
            .unwrap();
        store
            .append("a#1", "a.md", "second paragraph", vec![0.0, 1.0])
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), Some(2));
        assert_eq!(store.get("a#1").unwrap().content, "second paragraph");
        assert!(store.contains("a#0"));
        assert!(!store.contains("b#0"));
    }

    #[test]
    fn test_get_missing() {
        let store = EmbeddingStore::new();
        let err = store.get("ghost").unwrap_err();
        assert!(matches!(err, LorehoundError::ChunkNotFound(_)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = EmbeddingStore::new();
        store.append("x", "a.md", "text", vec![1.0, 2.0]).unwrap();
        let err = store
            .append("x", "b.md", "other", vec![3.0, 4.0])
            .unwrap_err();
        assert!(matches!(err, LorehoundError::DuplicateChunk(_)));
        // Store unchanged
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("x").unwrap().source, "a.md");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = EmbeddingStore::new();
        store.append("x", "a.md", "text", vec![1.0, 2.0]).unwrap();
        let err = store
            .append("y", "a.md", "more", vec![1.0, 2.0, 3.0])
            .unwrap_err();
        assert!(matches!(
            err,
            LorehoundError::DimensionMismatch { expected: 2, actual: 3 }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_append_fixes_dimension() {
        let mut store = EmbeddingStore::new();
        assert_eq!(store.dimension(), None);
        store.append("x", "a.md", "text", vec![0.0; 1536]).unwrap();
        assert_eq!(store.dimension(), Some(1536));
    }

    #[test]
    fn test_vectors_aligned_with_chunks() {
        let mut store = EmbeddingStore::new();
        store.append("a", "s", "1", vec![1.0, 0.0]).unwrap();
        store.append("b", "s", "2", vec![0.0, 1.0]).unwrap();

        let vectors = store.vectors();
        let chunks = store.chunks();
        assert_eq!(vectors.len(), chunks.len());
        for (v, c) in vectors.iter().zip(chunks.iter()) {
            assert_eq!(*v, c.embedding.as_slice());
        }
    }

    #[test]
    fn test_sources_first_seen_order() {
        let mut store = EmbeddingStore::new();
        store.append("a", "one.md", "1", vec![1.0]).unwrap();
        store.append("b", "two.md", "2", vec![1.0]).unwrap();
        store.append("c", "one.md", "3", vec![1.0]).unwrap();
        assert_eq!(store.sources(), vec!["one.md", "two.md"]);
    }
}
