//! Vector scoring backends and the one-time backend selector.
//!
//! Both backends compute cosine similarity `dot(q, v) / (||q|| * ||v||)`
//! with a zero-norm similarity of 0.0. The accelerated backend batches the
//! corpus scan across threads with SIMD dot products; the portable backend
//! is a plain scalar loop and doubles as the correctness oracle in tests.
//! A failed acceleration probe is never an error — selection always lands on
//! at least the portable backend.

use std::sync::OnceLock;

use rayon::prelude::*;

use lorehound_core::error::{LorehoundError, Result};

use crate::simd::{self, SimdIsa};

/// Which backend variant is active. Immutable once selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Accelerated,
    Portable,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Accelerated => write!(f, "accelerated"),
            BackendKind::Portable => write!(f, "portable"),
        }
    }
}

/// A strategy for scoring a query vector against a corpus.
///
/// Pure: no side effects, output index-aligned with the corpus.
pub trait VectorBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// One cosine similarity per corpus vector, in corpus order.
    ///
    /// Fails with `DimensionMismatch` when any corpus vector's length
    /// differs from the query's.
    fn score_all(&self, query: &[f32], corpus: &[&[f32]]) -> Result<Vec<f32>>;
}

fn check_dimensions(query: &[f32], corpus: &[&[f32]]) -> Result<()> {
    for v in corpus {
        if v.len() != query.len() {
            return Err(LorehoundError::DimensionMismatch {
                expected: query.len(),
                actual: v.len(),
            });
        }
    }
    Ok(())
}

fn cosine_from_parts(dot: f32, query_norm: f32, vec_norm: f32) -> f32 {
    if query_norm == 0.0 || vec_norm == 0.0 {
        return 0.0;
    }
    dot / (query_norm * vec_norm)
}

/// SIMD-accelerated backend. Constructed only when the CPU probe succeeds.
pub struct AcceleratedBackend {
    isa: SimdIsa,
}

impl AcceleratedBackend {
    /// Probe the CPU. `None` means no supported SIMD level — the caller
    /// falls back to [`PortableBackend`].
    pub fn probe() -> Option<Self> {
        simd::detect().map(|isa| Self { isa })
    }

    /// The instruction set the probe landed on.
    pub fn isa(&self) -> SimdIsa {
        self.isa
    }
}

impl VectorBackend for AcceleratedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn score_all(&self, query: &[f32], corpus: &[&[f32]]) -> Result<Vec<f32>> {
        check_dimensions(query, corpus)?;

        let isa = self.isa;
        let query_norm = simd::dot_product(isa, query, query).sqrt();

        let scores = corpus
            .par_iter()
            .map(|v| {
                let dot = simd::dot_product(isa, query, v);
                let vec_norm = simd::dot_product(isa, v, v).sqrt();
                cosine_from_parts(dot, query_norm, vec_norm)
            })
            .collect();

        Ok(scores)
    }
}

/// Scalar backend — always available.
pub struct PortableBackend;

impl VectorBackend for PortableBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Portable
    }

    fn score_all(&self, query: &[f32], corpus: &[&[f32]]) -> Result<Vec<f32>> {
        check_dimensions(query, corpus)?;

        let query_norm = simd::dot_product_scalar(query, query).sqrt();

        let scores = corpus
            .iter()
            .map(|v| {
                let dot = simd::dot_product_scalar(query, v);
                let vec_norm = simd::dot_product_scalar(v, v).sqrt();
                cosine_from_parts(dot, query_norm, vec_norm)
            })
            .collect();

        Ok(scores)
    }
}

static SELECTED: OnceLock<Box<dyn VectorBackend>> = OnceLock::new();

/// Run the acceleration probe and pick a backend.
///
/// Never fails: a probe miss lands on the portable backend.
pub fn select() -> Box<dyn VectorBackend> {
    match AcceleratedBackend::probe() {
        Some(backend) => {
            tracing::debug!("vector backend: accelerated ({})", backend.isa());
            Box::new(backend)
        }
        None => {
            tracing::debug!("vector backend: portable (no SIMD support detected)");
            Box::new(PortableBackend)
        }
    }
}

/// The process-wide backend, probed exactly once on first use.
///
/// Concurrent first callers wait on the same initialization; the probe never
/// re-runs. Tests that need a specific backend construct one directly
/// instead of going through here.
pub fn global() -> &'static dyn VectorBackend {
    SELECTED.get_or_init(select).as_ref()
}
