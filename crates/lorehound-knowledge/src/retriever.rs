//! Semantic retrieval: embed the query, score the corpus, rank the results.

use std::sync::Arc;
use std::time::Instant;

use lorehound_core::error::{LorehoundError, Result};
use lorehound_core::traits::Provider;

use crate::backend::{self, BackendKind, VectorBackend};
use crate::store::{Chunk, EmbeddingStore};

/// One ranked retrieval hit.
///
/// Borrows its chunk from the store — the store stays sole owner of chunk
/// data, and results are only valid while the store is alive.
#[derive(Debug, Clone, Copy)]
pub struct ScoredResult<'a> {
    pub chunk: &'a Chunk,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    /// 0-based position in descending-score order.
    pub rank: usize,
}

/// Orchestrates query embedding, backend scoring, and ranking.
pub struct SemanticRetriever {
    provider: Arc<dyn Provider>,
    /// Injected backend; `None` means the process-wide probed one.
    backend: Option<Box<dyn VectorBackend>>,
}

impl SemanticRetriever {
    /// Use the process-wide backend (probed once on first retrieval).
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider, backend: None }
    }

    /// Use an explicitly provided backend instead of the probed one.
    pub fn with_backend(provider: Arc<dyn Provider>, backend: Box<dyn VectorBackend>) -> Self {
        Self { provider, backend: Some(backend) }
    }

    fn backend(&self) -> &dyn VectorBackend {
        match &self.backend {
            Some(b) => b.as_ref(),
            None => backend::global(),
        }
    }

    /// Which backend variant this retriever scores with.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend().kind()
    }

    /// Retrieve the `top_k` most similar chunks for `query_text`.
    ///
    /// Guarantees: at most `min(top_k, store.len())` results, scores
    /// non-increasing by rank, equal scores ranked in insertion order, no
    /// mutation of the store. An empty store yields an empty result, not an
    /// error.
    pub async fn retrieve<'a>(
        &self,
        query_text: &str,
        top_k: usize,
        store: &'a EmbeddingStore,
    ) -> Result<Vec<ScoredResult<'a>>> {
        self.retrieve_inner(query_text, top_k, None, store).await
    }

    /// Like [`retrieve`](Self::retrieve), but drops results scoring below
    /// `score_threshold` before applying the `top_k` cap.
    pub async fn retrieve_filtered<'a>(
        &self,
        query_text: &str,
        top_k: usize,
        score_threshold: f32,
        store: &'a EmbeddingStore,
    ) -> Result<Vec<ScoredResult<'a>>> {
        self.retrieve_inner(query_text, top_k, Some(score_threshold), store)
            .await
    }

    async fn retrieve_inner<'a>(
        &self,
        query_text: &str,
        top_k: usize,
        score_threshold: Option<f32>,
        store: &'a EmbeddingStore,
    ) -> Result<Vec<ScoredResult<'a>>> {
        if top_k == 0 {
            return Err(LorehoundError::InvalidArgument(
                "top_k must be positive".into(),
            ));
        }

        // Embedding happens before the empty-store check so a broken
        // provider surfaces even on an empty knowledge base.
        let query_vec = self.provider.embed(query_text).await?;

        if store.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let backend = self.backend();
        let scores = backend.score_all(&query_vec, &store.vectors())?;

        let mut paired: Vec<(&Chunk, f32)> =
            store.chunks().iter().zip(scores).collect();
        // Stable sort: equal scores keep insertion order.
        paired.sort_by(|a, b| b.1.total_cmp(&a.1));

        if let Some(threshold) = score_threshold {
            paired.retain(|(_, score)| *score >= threshold);
        }
        paired.truncate(top_k);

        let results: Vec<ScoredResult<'a>> = paired
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk, score))| ScoredResult { chunk, score, rank })
            .collect();

        tracing::debug!(
            "retrieved {} of {} chunks in {:.2}ms via {} backend",
            results.len(),
            store.len(),
            started.elapsed().as_secs_f64() * 1000.0,
            backend.kind()
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AcceleratedBackend, PortableBackend};

    use std::collections::HashMap;

    use async_trait::async_trait;
    use lorehound_core::traits::GenerateParams;
    use lorehound_core::types::{Message, ModelInfo, ProviderResponse};

    /// Embedding provider stub with canned vectors.
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        fail: bool,
    }

    impl StubEmbedder {
        fn new(entries: &[(&str, &[f32])]) -> Self {
            Self {
                vectors: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self { vectors: HashMap::new(), fail: true }
        }
    }

    #[async_trait]
    impl Provider for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _params: &GenerateParams,
        ) -> lorehound_core::error::Result<ProviderResponse> {
            unimplemented!("retrieval tests never chat")
        }

        async fn embed_many(
            &self,
            texts: &[String],
        ) -> lorehound_core::error::Result<Vec<Vec<f32>>> {
            if self.fail {
                return Err(LorehoundError::EmbeddingProvider("stub down".into()));
            }
            texts
                .iter()
                .map(|t| {
                    self.vectors.get(t).cloned().ok_or_else(|| {
                        LorehoundError::EmbeddingProvider(format!("no stub vector for {t:?}"))
                    })
                })
                .collect()
        }

        async fn list_models(&self) -> lorehound_core::error::Result<Vec<ModelInfo>> {
            Ok(vec![])
        }

        async fn health_check(&self) -> lorehound_core::error::Result<bool> {
            Ok(true)
        }
    }

    fn three_chunk_store() -> EmbeddingStore {
        let mut store = EmbeddingStore::new();
        store.append("first", "a.md", "east", vec![1.0, 0.0]).unwrap();
        store.append("second", "a.md", "north", vec![0.0, 1.0]).unwrap();
        store
            .append("third", "b.md", "northeast", vec![0.7, 0.7])
            .unwrap();
        store
    }

    fn portable_retriever(embedder: StubEmbedder) -> SemanticRetriever {
        SemanticRetriever::with_backend(Arc::new(embedder), Box::new(PortableBackend))
    }

    #[tokio::test]
    async fn test_ranked_retrieval() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("where is east?", &[1.0, 0.0])]));

        let results = retriever.retrieve("where is east?", 3, &store).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.id, "first");
        assert_eq!(results[1].chunk.id, "third");
        assert_eq!(results[2].chunk.id, "second");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!((results[1].score - 0.707).abs() < 1e-3);
        assert!(results[2].score.abs() < 1e-5);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.rank, i);
        }
    }

    #[tokio::test]
    async fn test_top_k_caps_results() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("where is east?", &[1.0, 0.0])]));

        let results = retriever.retrieve("where is east?", 2, &store).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "first");
        assert_eq!(results[1].chunk.id, "third");
    }

    #[tokio::test]
    async fn test_top_k_beyond_store_returns_all() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("where is east?", &[1.0, 0.0])]));

        let results = retriever.retrieve("where is east?", 50, &store).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let store = three_chunk_store();
        let retriever = portable_retriever(StubEmbedder::new(&[("q", &[1.0, 0.0])]));

        let err = retriever.retrieve("q", 0, &store).await.unwrap_err();
        assert!(matches!(err, LorehoundError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty() {
        let store = EmbeddingStore::new();
        let retriever = portable_retriever(StubEmbedder::new(&[("q", &[1.0, 0.0])]));

        let results = retriever.retrieve("q", 3, &store).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_embedder_failure_propagates() {
        let store = three_chunk_store();
        let retriever = portable_retriever(StubEmbedder::failing());

        let err = retriever.retrieve("q", 3, &store).await.unwrap_err();
        assert!(matches!(err, LorehoundError::EmbeddingProvider(_)));
        // Store untouched
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("q", &[1.0, 0.0, 0.0])]));

        let err = retriever.retrieve("q", 3, &store).await.unwrap_err();
        assert!(matches!(err, LorehoundError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let mut store = EmbeddingStore::new();
        // Identical vectors: every score ties
        store.append("one", "s", "1", vec![1.0, 0.0]).unwrap();
        store.append("two", "s", "2", vec![1.0, 0.0]).unwrap();
        store.append("three", "s", "3", vec![1.0, 0.0]).unwrap();

        let retriever = portable_retriever(StubEmbedder::new(&[("q", &[1.0, 0.0])]));
        let results = retriever.retrieve("q", 3, &store).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_deterministic_across_calls() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("q", &[0.5, 0.5])]));

        let a = retriever.retrieve("q", 3, &store).await.unwrap();
        let b = retriever.retrieve("q", 3, &store).await.unwrap();

        let ids_a: Vec<&str> = a.iter().map(|r| r.chunk.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.score, y.score);
        }
    }

    #[tokio::test]
    async fn test_backend_variants_agree() {
        let Some(accel) = AcceleratedBackend::probe() else {
            return;
        };
        let store = three_chunk_store();

        let fast = SemanticRetriever::with_backend(
            Arc::new(StubEmbedder::new(&[("q", &[0.9, 0.1])])),
            Box::new(accel),
        );
        let slow = portable_retriever(StubEmbedder::new(&[("q", &[0.9, 0.1])]));

        let a = fast.retrieve("q", 3, &store).await.unwrap();
        let b = slow.retrieve("q", 3, &store).await.unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.chunk.id, y.chunk.id);
            assert!((x.score - y.score).abs() <= y.score.abs() * 1e-5 + 1e-6);
        }
    }

    #[tokio::test]
    async fn test_scores_non_increasing() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("q", &[0.3, 0.8])]));

        let results = retriever.retrieve("q", 3, &store).await.unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_threshold_filters_low_scores() {
        let store = three_chunk_store();
        let retriever =
            portable_retriever(StubEmbedder::new(&[("q", &[1.0, 0.0])]));

        let results = retriever
            .retrieve_filtered("q", 3, 0.6, &store)
            .await
            .unwrap();

        // Scores are ~[1.0, 0.707, 0.0]; the orthogonal chunk is dropped
        assert_eq!(results.len(), 2);
        for r in &results {
            assert!(r.score >= 0.6);
        }
        assert_eq!(results[0].rank, 0);
        assert_eq!(results[1].rank, 1);
    }

    #[tokio::test]
    async fn test_backend_kind_reported() {
        let retriever = portable_retriever(StubEmbedder::new(&[]));
        assert_eq!(retriever.backend_kind(), BackendKind::Portable);
    }
}
