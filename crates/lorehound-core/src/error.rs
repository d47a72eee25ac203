//! Lorehound error taxonomy.
//!
//! Structural errors (dimension/duplicate/not-found/invalid-argument) are
//! deterministic and never retried. `EmbeddingProvider` is the only
//! transient-failure class; retry policy belongs to the caller.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, LorehoundError>;

#[derive(Debug, Error)]
pub enum LorehoundError {
    /// A vector's length differs from the established dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A chunk with this identifier already exists in the store.
    #[error("duplicate chunk id: {0}")]
    DuplicateChunk(String),

    /// No chunk with this identifier exists in the store.
    #[error("chunk not found: {0}")]
    ChunkNotFound(String),

    /// Caller misuse (e.g. top_k of zero).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The external embedding provider failed (timeout, auth, malformed
    /// response). Carries the underlying cause as text.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("unknown provider: {0}")]
    ProviderNotFound(String),

    #[error("memory error: {0}")]
    Memory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = LorehoundError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 1536, got 768");

        let e = LorehoundError::DuplicateChunk("doc.md#3".into());
        assert!(e.to_string().contains("doc.md#3"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: LorehoundError = io.into();
        assert!(matches!(e, LorehoundError::Io(_)));
    }
}
