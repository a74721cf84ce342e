//! Overlapping fixed-window text chunker.
//!
//! Splits document text into windows of `chunk_size` characters that share
//! `overlap` characters with their predecessor, advancing
//! `chunk_size - overlap` characters per step. The final window may be
//! shorter; splitting stops once a window reaches the end of the document.
//!
//! The unit is characters (Unicode scalar values), not bytes, so windows
//! can never split a UTF-8 sequence. Chunking is deterministic: the same
//! document and parameters always produce the identical chunk sequence,
//! which is what makes rebuilt indices reproducible.

use crate::corpus::Document;
use crate::error::ConfigError;

/// A bounded text window derived from one document, the unit indexed for
/// retrieval. Identified by `(doc_id, ordinal)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub doc_id: String,
    pub ordinal: usize,
}

/// Validated chunking parameters.
///
/// The invariant `overlap < chunk_size` guarantees a positive stride, so
/// splitting always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split one document into overlapping windows.
///
/// Empty documents produce zero chunks. Ordinals are contiguous from 0 and
/// every chunk carries the document id as provenance.
pub fn split_document(doc: &Document, params: &ChunkParams) -> Vec<Chunk> {
    // Byte offset of every char, so windows measured in chars can be
    // sliced without scanning.
    let offsets: Vec<usize> = doc.text.char_indices().map(|(i, _)| i).collect();
    let total = offsets.len();
    if total == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut ordinal = 0usize;

    loop {
        let end = (start + params.chunk_size).min(total);
        let byte_start = offsets[start];
        let byte_end = if end == total {
            doc.text.len()
        } else {
            offsets[end]
        };

        chunks.push(Chunk {
            text: doc.text[byte_start..byte_end].to_string(),
            doc_id: doc.id.clone(),
            ordinal,
        });
        ordinal += 1;

        if end == total {
            break;
        }
        start += params.stride();
    }

    chunks
}

/// Split a whole corpus, flattening in document order.
pub fn split_corpus(documents: &[Document], params: &ChunkParams) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| split_document(doc, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn doc(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    fn params(chunk_size: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(chunk_size, overlap).unwrap()
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert_eq!(ChunkParams::new(0, 0), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn rejects_overlap_not_below_chunk_size() {
        assert_eq!(
            ChunkParams::new(10, 10),
            Err(ConfigError::OverlapTooLarge {
                chunk_size: 10,
                overlap: 10
            })
        );
        assert!(ChunkParams::new(10, 15).is_err());
        assert!(ChunkParams::new(10, 9).is_ok());
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let chunks = split_document(&doc("a.md", "hello"), &params(10, 2));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello");
        assert_eq!(chunks[0].doc_id, "a.md");
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn empty_document_produces_no_chunks() {
        assert!(split_document(&doc("a.md", ""), &params(10, 2)).is_empty());
    }

    #[test]
    fn windows_overlap_by_the_configured_amount() {
        // stride 3: windows 0..5, 3..8, 6..10
        let chunks = split_document(&doc("a.md", "abcdefghij"), &params(5, 2));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "abcde");
        assert_eq!(chunks[1].text, "defgh");
        assert_eq!(chunks[2].text, "ghij");
    }

    #[test]
    fn ordinals_are_contiguous() {
        let chunks = split_document(&doc("a.md", &"x".repeat(100)), &params(7, 3));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.ordinal, i);
        }
    }

    #[test]
    fn every_chunk_respects_the_size_bound() {
        let chunks = split_document(&doc("a.md", &"y".repeat(137)), &params(30, 10));
        for c in &chunks {
            assert!(c.text.chars().count() <= 30);
        }
    }

    #[test]
    fn splitting_is_idempotent() {
        let d = doc("a.md", "The quick brown fox jumps over the lazy dog, twice.");
        let p = params(12, 4);
        assert_eq!(split_document(&d, &p), split_document(&d, &p));
    }

    #[test]
    fn chunks_reconstruct_the_document_exactly() {
        // First chunk verbatim, then each later chunk minus its leading
        // overlap, must concatenate back to the original text.
        for (text, chunk_size, overlap) in [
            ("abcdefghijklmnopqrstuvwxyz", 8, 3),
            ("abcdefghij", 8, 4),
            ("short", 100, 10),
            ("Die Höhenzüge über dem Tal — äöü ß € 日本語のテキスト", 7, 2),
        ] {
            let p = params(chunk_size, overlap);
            let chunks = split_document(&doc("a.md", text), &p);
            let mut rebuilt = String::new();
            for (i, c) in chunks.iter().enumerate() {
                if i == 0 {
                    rebuilt.push_str(&c.text);
                } else {
                    rebuilt.extend(c.text.chars().skip(overlap));
                }
            }
            assert_eq!(rebuilt, text, "size={} overlap={}", chunk_size, overlap);
        }
    }

    #[test]
    fn multibyte_text_never_splits_a_character() {
        let text = "日本語のテキストです。改行も含む。\nもう一行。";
        let chunks = split_document(&doc("a.md", text), &params(5, 1));
        for c in &chunks {
            // Slicing at a non-boundary would have panicked already; check
            // the window length in chars as well.
            assert!(c.text.chars().count() <= 5);
        }
    }

    #[test]
    fn corpus_split_preserves_document_order() {
        let docs = vec![doc("a.md", "aaaa"), doc("b.md", "bbbb")];
        let chunks = split_corpus(&docs, &params(10, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].doc_id, "a.md");
        assert_eq!(chunks[1].doc_id, "b.md");
    }
}
