//! In-memory vector index with brute-force cosine search.
//!
//! Built once at startup from all embedded chunks and never mutated
//! afterwards. `search` takes `&self` and the struct has no interior
//! mutability, so any number of concurrent readers is safe by construction.
//!
//! Search is an exact brute-force scan; retrieval is fully deterministic.
//! Cosine similarity is the fixed metric: it normalizes for document-length
//! effects that raw inner product would leak into the ranking.
//!
//! There is no "not yet built" state to misuse: the only constructors are
//! [`VectorIndex::build`] (rejects zero chunks) and [`VectorIndex::empty`]
//! (the deliberate degenerate index for an empty corpus).

use crate::chunk::Chunk;
use crate::error::IndexError;

/// A chunk together with its embedding vector, as fed into `build`.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// One retrieval hit: a chunk and its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl VectorIndex {
    /// One-time bulk construction.
    ///
    /// All vectors must share one dimension, i.e. come from a single
    /// provider configuration. Zero chunks is rejected; an intentionally
    /// empty index is created with [`VectorIndex::empty`] instead, so the
    /// two cases stay distinguishable.
    pub fn build(embedded: Vec<EmbeddedChunk>) -> Result<Self, IndexError> {
        let dims = match embedded.first() {
            Some(first) => first.vector.len(),
            None => return Err(IndexError::EmptyBuild),
        };

        let mut chunks = Vec::with_capacity(embedded.len());
        let mut vectors = Vec::with_capacity(embedded.len());
        for item in embedded {
            if item.vector.len() != dims {
                return Err(IndexError::DimensionMismatch {
                    expected: dims,
                    actual: item.vector.len(),
                });
            }
            chunks.push(item.chunk);
            vectors.push(item.vector);
        }

        Ok(Self {
            chunks,
            vectors,
            dims,
        })
    }

    /// The degenerate index over an empty corpus. Every search returns an
    /// empty result, which the router turns into the fixed "don't know"
    /// answer.
    pub fn empty(dims: usize) -> Self {
        Self {
            chunks: Vec::new(),
            vectors: Vec::new(),
            dims,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Up to `k` nearest chunks by cosine similarity, descending.
    ///
    /// Exactly equal scores tie-break by insertion order, so results are
    /// stable across identical calls.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for mismatched or zero-norm
/// vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: &str, ordinal: usize) -> Chunk {
        Chunk {
            text: format!("{} chunk {}", doc, ordinal),
            doc_id: doc.to_string(),
            ordinal,
        }
    }

    fn embedded(doc: &str, ordinal: usize, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: chunk(doc, ordinal),
            vector,
        }
    }

    #[test]
    fn build_rejects_zero_chunks() {
        assert!(matches!(
            VectorIndex::build(Vec::new()),
            Err(IndexError::EmptyBuild)
        ));
    }

    #[test]
    fn build_rejects_mixed_dimensions() {
        let result = VectorIndex::build(vec![
            embedded("a.md", 0, vec![1.0, 0.0]),
            embedded("a.md", 1, vec![1.0, 0.0, 0.0]),
        ]);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let index = VectorIndex::build(vec![embedded("a.md", 0, vec![1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 3),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn results_are_ordered_by_descending_similarity() {
        let index = VectorIndex::build(vec![
            embedded("far.md", 0, vec![0.0, 1.0]),
            embedded("near.md", 0, vec![1.0, 0.1]),
            embedded("exact.md", 0, vec![1.0, 0.0]),
        ])
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let docs: Vec<&str> = hits.iter().map(|h| h.chunk.doc_id.as_str()).collect();
        assert_eq!(docs, vec!["exact.md", "near.md", "far.md"]);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn equal_scores_tie_break_by_insertion_order() {
        // Same vector three times: scores are exactly equal.
        let index = VectorIndex::build(vec![
            embedded("first.md", 0, vec![1.0, 0.0]),
            embedded("second.md", 0, vec![1.0, 0.0]),
            embedded("third.md", 0, vec![1.0, 0.0]),
        ])
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let docs: Vec<&str> = hits.iter().map(|h| h.chunk.doc_id.as_str()).collect();
        assert_eq!(docs, vec!["first.md", "second.md", "third.md"]);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = VectorIndex::build(vec![embedded("a.md", 0, vec![1.0, 0.0])]).unwrap();
        assert_eq!(index.search(&[0.5, 0.5], 10).unwrap().len(), 1);
    }

    #[test]
    fn search_is_deterministic() {
        let index = VectorIndex::build(vec![
            embedded("a.md", 0, vec![0.9, 0.1, 0.3]),
            embedded("b.md", 0, vec![0.2, 0.8, 0.1]),
            embedded("c.md", 0, vec![0.4, 0.4, 0.4]),
        ])
        .unwrap();

        let query = [0.5, 0.3, 0.2];
        let first = index.search(&query, 2).unwrap();
        let second = index.search(&query, 2).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.chunk, b.chunk);
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = VectorIndex::empty(3);
        assert!(index.is_empty());
        assert_eq!(index.dims(), 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn cosine_identical_and_orthogonal() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
