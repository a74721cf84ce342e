//! Typed error taxonomy.
//!
//! Every fallible seam in the pipeline has its own error type so that
//! failure paths are visible in signatures:
//!
//! | Type | Raised by | Recovery |
//! |------|-----------|----------|
//! | [`ConfigError`] | chunking parameter validation | fatal at startup |
//! | [`EmbeddingError`] | embedding provider | skip-and-warn per chunk during index build |
//! | [`IndexError`] | vector index lifecycle misuse | fatal (programming error) |
//! | [`GenerationError`] | generation backends | surfaced to the caller as a service error |
//! | [`AnswerError`] | query router | mapped to the HTTP error contract |
//!
//! Startup errors (corpus load, index build, backend construction) abort
//! initialization; per-request errors are caught at the server boundary and
//! translated there. No internal error type crosses the boundary unmapped.

use thiserror::Error;

/// Invalid chunking parameters. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Embedding failure for a single input.
///
/// During the bulk index build these are recoverable per item: the failing
/// chunk is skipped with a warning rather than aborting the whole corpus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("cannot embed empty input")]
    EmptyInput,

    #[error("input of {chars} chars exceeds the provider limit of {max}")]
    InputTooLong { chars: usize, max: usize },

    #[error("embedding model error: {0}")]
    Model(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Vector index lifecycle misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// `build` was handed zero chunks. An intentionally empty index is
    /// constructed with `VectorIndex::empty` instead.
    #[error("cannot build a vector index from zero chunks")]
    EmptyBuild,

    #[error("vector dimension mismatch: index holds {expected}-dim vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Uniform failure surface for generation backends.
///
/// Transport-specific errors (HTTP status, connection refused, timeout) are
/// flattened into `message`; callers only ever see which backend failed and
/// why.
#[derive(Error, Debug, Clone)]
#[error("generation backend '{backend}' failed: {message}")]
pub struct GenerationError {
    pub backend: String,
    pub message: String,
}

impl GenerationError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Router-level error union, mapped to the HTTP error contract at the
/// server boundary.
#[derive(Error, Debug)]
pub enum AnswerError {
    /// Bad caller input; rejected before any retrieval or generation work.
    #[error("invalid model_type '{0}': expected one of gemini, llama, hybrid")]
    InvalidModel(String),

    /// A valid tag resolved to no registered backend. Startup wiring bug.
    #[error("no generation backend registered under '{0}'")]
    BackendUnavailable(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_names_the_backend() {
        let err = GenerationError::new("gemini", "HTTP 503: overloaded");
        let msg = err.to_string();
        assert!(msg.contains("gemini"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn invalid_model_lists_the_accepted_tags() {
        let msg = AnswerError::InvalidModel("gpt".to_string()).to_string();
        assert!(msg.contains("gpt"));
        assert!(msg.contains("hybrid"));
    }
}
