//! Knowledge base lifecycle: load documents, chunk, embed, search.
//!
//! The embedding store itself never touches the filesystem or the network —
//! this manager is the glue that feeds it: it walks a directory, chunks
//! paragraphs, requests embeddings in batches, and appends. Embedding
//! failure during ingestion leaves the store untouched (no partial state).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use lorehound_core::config::LorehoundConfig;
use lorehound_core::error::Result;
use lorehound_core::traits::Provider;
use lorehound_knowledge::backend::{BackendKind, PortableBackend};
use lorehound_knowledge::chunker::split_paragraphs;
use lorehound_knowledge::{EmbeddingStore, SemanticRetriever};

/// An owned retrieval hit, detached from the store's lifetime.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_id: String,
    pub source: String,
    pub content: String,
    pub score: f32,
    pub rank: usize,
}

/// Owns the embedding store and drives ingestion and search.
///
/// The store sits behind a readers-writer lock: searches share read access,
/// ingestion takes the write side, and the two never interleave.
pub struct KnowledgeManager {
    provider: Arc<dyn Provider>,
    store: RwLock<EmbeddingStore>,
    retriever: SemanticRetriever,
    batch_size: usize,
    chunk_min_chars: usize,
}

impl KnowledgeManager {
    pub fn new(provider: Arc<dyn Provider>, config: &LorehoundConfig) -> Self {
        let retriever = if config.retrieval.backend == "portable" {
            SemanticRetriever::with_backend(Arc::clone(&provider), Box::new(PortableBackend))
        } else {
            SemanticRetriever::new(Arc::clone(&provider))
        };
        Self {
            provider,
            store: RwLock::new(EmbeddingStore::new()),
            retriever,
            batch_size: config.embedding.batch_size.max(1),
            chunk_min_chars: config.knowledge.chunk_min_chars,
        }
    }

    /// Ingest every `*.md` / `*.txt` file under `dir` (recursive).
    ///
    /// Returns the number of chunks added.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<usize> {
        let mut files = Vec::new();
        collect_text_files(dir, &mut files)?;
        files.sort();

        if files.is_empty() {
            tracing::warn!("no .md or .txt files found in {}", dir.display());
            return Ok(0);
        }
        tracing::info!("loading {} files from {}", files.len(), dir.display());

        let mut drafts = Vec::new();
        for file in &files {
            let content = std::fs::read_to_string(file)?;
            let source = file
                .strip_prefix(dir)
                .unwrap_or(file)
                .to_string_lossy()
                .to_string();
            for (i, paragraph) in split_paragraphs(&content, self.chunk_min_chars)
                .into_iter()
                .enumerate()
            {
                drafts.push((format!("{source}#{i}"), source.clone(), paragraph));
            }
        }

        self.ingest_chunks(drafts).await
    }

    /// Ingest a single pre-loaded document.
    pub async fn ingest_document(&self, source: &str, text: &str) -> Result<usize> {
        let drafts = split_paragraphs(text, self.chunk_min_chars)
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("{source}#{i}"), source.to_string(), p))
            .collect();
        self.ingest_chunks(drafts).await
    }

    /// Embed and append `(id, source, content)` drafts.
    ///
    /// All embeddings are fetched before anything is appended, so a provider
    /// failure cannot leave half-ingested state behind.
    async fn ingest_chunks(&self, drafts: Vec<(String, String, String)>) -> Result<usize> {
        // Skip chunks already present (re-ingestion of an updated directory)
        let drafts = {
            let store = self.store.read().await;
            drafts
                .into_iter()
                .filter(|(id, _, _)| !store.contains(id))
                .collect::<Vec<_>>()
        };
        if drafts.is_empty() {
            return Ok(0);
        }

        let mut embedded = Vec::with_capacity(drafts.len());
        for batch in drafts.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, _, c)| c.clone()).collect();
            let vectors = self.provider.embed_many(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(lorehound_core::error::LorehoundError::EmbeddingProvider(
                    format!("{} embeddings for {} texts", vectors.len(), batch.len()),
                ));
            }
            for ((id, source, content), vector) in batch.iter().cloned().zip(vectors) {
                embedded.push((id, source, content, vector));
            }
            tracing::debug!("embedded batch of {}", batch.len());
        }

        // A ragged response would leave the store half-written; reject it
        // before the first append.
        if let Some((_, _, _, first)) = embedded.first() {
            let dim = first.len();
            if embedded.iter().any(|(_, _, _, v)| v.len() != dim) {
                return Err(lorehound_core::error::LorehoundError::EmbeddingProvider(
                    "provider returned embeddings of mixed dimensionality".into(),
                ));
            }
        }

        let mut store = self.store.write().await;
        let mut added = 0;
        for (id, source, content, vector) in embedded {
            store.append(id, source, content, vector)?;
            added += 1;
        }
        tracing::info!("added {added} chunks to the knowledge base");
        Ok(added)
    }

    /// Search the knowledge base, dropping hits below `score_threshold`.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>> {
        let store = self.store.read().await;
        let results = self
            .retriever
            .retrieve_filtered(query, top_k, score_threshold, &store)
            .await?;
        Ok(results
            .iter()
            .map(|r| SearchHit {
                chunk_id: r.chunk.id.clone(),
                source: r.chunk.source.clone(),
                content: r.chunk.content.clone(),
                score: r.score,
                rank: r.rank,
            })
            .collect())
    }

    /// Unfiltered top-k search.
    pub async fn search_all(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let store = self.store.read().await;
        let results = self.retriever.retrieve(query, top_k, &store).await?;
        Ok(results
            .iter()
            .map(|r| SearchHit {
                chunk_id: r.chunk.id.clone(),
                source: r.chunk.source.clone(),
                content: r.chunk.content.clone(),
                score: r.score,
                rank: r.rank,
            })
            .collect())
    }

    pub async fn chunk_count(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn sources(&self) -> Vec<String> {
        self.store
            .read()
            .await
            .sources()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub async fn dimension(&self) -> Option<usize> {
        self.store.read().await.dimension()
    }

    /// Which vector backend searches run on.
    pub fn backend_kind(&self) -> BackendKind {
        self.retriever.backend_kind()
    }
}

fn collect_text_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Err(lorehound_core::error::LorehoundError::InvalidArgument(
            format!("not a directory: {}", dir.display()),
        ));
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_text_files(&path, out)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("txt")
        ) {
            out.push(path);
        }
    }
    Ok(())
}
