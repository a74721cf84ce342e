//! Service initialization.
//!
//! [`initialize`] runs the whole startup pipeline (load corpus → chunk →
//! embed → build index → construct backends) and returns an immutable,
//! reference-counted [`ServiceState`] handle that every request handler
//! shares. Nothing mutates the state afterwards; re-initialization means
//! calling `initialize` again and swapping the handle.
//!
//! Startup is a blocking, non-cancelable phase: the HTTP listener only
//! binds after this function returns, so no request can ever observe a
//! half-built index. Any infrastructure failure here (unreadable corpus,
//! bad chunk parameters, missing API key) aborts startup; the service
//! never reports ready over an incomplete index.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::backend::{BackendRegistry, GeminiBackend, OllamaBackend};
use crate::chunk::{split_corpus, Chunk, ChunkParams};
use crate::config::Config;
use crate::corpus::load_corpus;
use crate::embedding::{EmbeddingProvider, FastEmbedProvider};
use crate::index::{EmbeddedChunk, VectorIndex};
use crate::router::QueryRouter;
use crate::rules::RulesEngine;

/// Corpus statistics captured at build time, reported by `GET /health`.
#[derive(Debug, Clone, Copy)]
pub struct CorpusStats {
    pub documents: usize,
    pub chunks: usize,
}

/// The shared, read-only state behind every request.
pub struct ServiceState {
    pub router: QueryRouter,
    pub stats: CorpusStats,
    pub embedding_model: String,
}

/// Build the service from configuration.
pub async fn initialize(config: &Config) -> Result<Arc<ServiceState>> {
    let params = ChunkParams::new(config.chunking.chunk_size, config.chunking.overlap)?;

    let documents = load_corpus(&config.corpus)?;
    tracing::info!(
        documents = documents.len(),
        dir = %config.corpus.dir.display(),
        "loaded corpus"
    );

    let chunks = split_corpus(&documents, &params);
    tracing::info!(chunks = chunks.len(), "chunked corpus");

    // Model init downloads and loads an ONNX session; keep it off the
    // async runtime.
    let embedding_config = config.embedding.clone();
    let provider = tokio::task::spawn_blocking(move || FastEmbedProvider::new(&embedding_config))
        .await
        .context("embedding model initialization task failed")??;
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(provider);

    let embedder = provider.clone();
    let embedded = tokio::task::spawn_blocking(move || embed_chunks(embedder.as_ref(), chunks))
        .await
        .context("index embedding task failed")?;

    let stats = CorpusStats {
        documents: documents.len(),
        chunks: embedded.len(),
    };

    let index = if embedded.is_empty() {
        tracing::warn!("corpus produced no indexable chunks; answers will fall back to no-context");
        VectorIndex::empty(provider.dims())
    } else {
        VectorIndex::build(embedded)?
    };
    tracing::info!(chunks = index.len(), dims = index.dims(), "vector index ready");

    let mut backends = BackendRegistry::new();
    backends.register(Arc::new(GeminiBackend::new(&config.backends.gemini)?));
    backends.register(Arc::new(OllamaBackend::new(&config.backends.llama)?));
    tracing::info!(backends = ?backends.names(), "generation backends ready");

    let router = QueryRouter::new(
        RulesEngine::default(),
        provider.clone(),
        Arc::new(index),
        backends,
        config.retrieval.top_k,
    );

    Ok(Arc::new(ServiceState {
        router,
        stats,
        embedding_model: provider.model_name().to_string(),
    }))
}

/// Embed all chunks for the index build.
///
/// Tries one batch call first. If the batch fails, falls back to embedding
/// chunk by chunk so that a single bad chunk is skipped with a warning
/// instead of aborting the whole corpus, and never silently.
fn embed_chunks(provider: &dyn EmbeddingProvider, chunks: Vec<Chunk>) -> Vec<EmbeddedChunk> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    match provider.embed_batch(&texts) {
        Ok(vectors) => chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect(),
        Err(batch_err) => {
            tracing::warn!(error = %batch_err, "batch embedding failed, retrying per chunk");
            let mut embedded = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                match provider.embed(&chunk.text) {
                    Ok(vector) => embedded.push(EmbeddedChunk { chunk, vector }),
                    Err(e) => {
                        tracing::warn!(
                            doc = %chunk.doc_id,
                            ordinal = chunk.ordinal,
                            error = %e,
                            "skipping chunk that failed to embed"
                        );
                    }
                }
            }
            embedded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;

    /// Embedder that fails batches and rejects one poisoned text per item.
    struct FlakyEmbedder;

    impl EmbeddingProvider for FlakyEmbedder {
        fn model_name(&self) -> &str {
            "flaky"
        }
        fn dims(&self) -> usize {
            2
        }
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if text.contains("poison") {
                return Err(EmbeddingError::Model("poisoned".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Model("batch unsupported".to_string()))
        }
    }

    fn chunk(text: &str, ordinal: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            doc_id: "doc.md".to_string(),
            ordinal,
        }
    }

    #[test]
    fn failing_batch_falls_back_to_per_chunk_and_skips_bad_items() {
        let chunks = vec![chunk("good one", 0), chunk("poisoned text", 1), chunk("fine", 2)];
        let embedded = embed_chunks(&FlakyEmbedder, chunks);
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[0].chunk.ordinal, 0);
        assert_eq!(embedded[1].chunk.ordinal, 2);
    }

    #[test]
    fn no_chunks_embed_to_nothing() {
        assert!(embed_chunks(&FlakyEmbedder, Vec::new()).is_empty());
    }
}
