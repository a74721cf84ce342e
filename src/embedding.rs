//! Embedding provider abstraction.
//!
//! Defines the [`EmbeddingProvider`] trait and the production
//! [`FastEmbedProvider`], which runs ONNX sentence-embedding models locally
//! via fastembed. Models are downloaded on first use and cached; after that
//! no network calls are needed.
//!
//! Everything downstream of this trait (the vector index, the router)
//! depends only on two guarantees: a stable dimension across calls, and
//! determinism for a fixed model. Mixing vectors from differently
//! configured providers in one index silently corrupts distance
//! comparisons, so the index re-checks dimensions at build and query time.
//!
//! Input limits are surfaced as [`EmbeddingError`], never silently
//! truncated.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// Upper input bound accepted by [`FastEmbedProvider`], in characters.
///
/// The underlying models truncate around 512 tokens; refusing far-oversized
/// input here keeps that truncation from happening silently.
pub const MAX_INPUT_CHARS: usize = 8192;

pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;

    /// Vector dimensionality; stable across calls for one provider.
    fn dims(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Batch form, required for index-build throughput.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Map a configured model name to the fastembed model and its dimension.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    match name {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "nomic-embed-text-v1.5" => Ok((EmbeddingModel::NomicEmbedTextV15, 768)),
        "multilingual-e5-small" => Ok((EmbeddingModel::MultilingualE5Small, 384)),
        other => Err(EmbeddingError::Model(format!(
            "unknown embedding model '{}'. Supported models: all-minilm-l6-v2, \
             bge-small-en-v1.5, bge-base-en-v1.5, nomic-embed-text-v1.5, \
             multilingual-e5-small",
            other
        ))),
    }
}

pub(crate) fn validate_input(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    let chars = text.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(EmbeddingError::InputTooLong {
            chars,
            max: MAX_INPUT_CHARS,
        });
    }
    Ok(())
}

/// Local embedding provider backed by a fastembed ONNX session.
///
/// The session needs exclusive access per inference call, so it sits behind
/// a mutex; the lock is held only for the duration of one embed call and
/// never across any await point.
pub struct FastEmbedProvider {
    session: Mutex<TextEmbedding>,
    model_name: String,
    dims: usize,
    batch_size: usize,
}

impl FastEmbedProvider {
    /// Initialize the model. Downloads it on first use, so this is
    /// expensive: call it once at startup, off the async runtime.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let (model, dims) = resolve_model(&config.model)?;

        tracing::info!(model = %config.model, dims, "initializing embedding model");

        let session = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(true),
        )
        .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            model_name: config.model.clone(),
            dims,
            batch_size: config.batch_size,
        })
    }

    fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Model("embedding session poisoned".to_string()))?;

        let vectors = session
            .embed(texts, Some(self.batch_size))
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        for vector in &vectors {
            if vector.len() != self.dims {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dims,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        validate_input(text)?;
        let mut vectors = self.run(vec![text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Model("empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            validate_input(text)?;
        }
        self.run(texts.to_vec())
    }
}
