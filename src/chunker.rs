//! Splits long documents into overlapping, token-bounded chunks.

use crate::config::{ConfigError, SummarizationConfig};
use crate::tokenizer::{Tokenizer, WhitespaceTokenizer};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;

/// A contiguous slice of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in document order
    pub index: usize,
    /// `source[byte_range]`
    pub text: String,
    pub byte_range: Range<usize>,
    pub token_range: Range<usize>,
    /// Length in bytes of the prefix shared with the previous chunk
    pub overlap_bytes: usize,
}

impl Chunk {
    pub fn token_count(&self) -> usize {
        self.token_range.len()
    }

    /// The part of the chunk not already covered by its predecessor
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap_bytes..]
    }
}

/// Token-window chunker.
///
/// Construction enforces `overlap < max_tokens`, so `chunk` always terminates.
#[derive(Clone)]
pub struct Chunker {
    max_tokens: usize,
    overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("max_tokens", &self.max_tokens)
            .field("overlap", &self.overlap)
            .finish()
    }
}

impl Chunker {
    pub fn new(max_tokens: usize, overlap: usize) -> Result<Self, ConfigError> {
        Self::with_tokenizer(max_tokens, overlap, Arc::new(WhitespaceTokenizer))
    }

    pub fn with_tokenizer(
        max_tokens: usize,
        overlap: usize,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, ConfigError> {
        if max_tokens == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if overlap >= max_tokens {
            return Err(ConfigError::OverlapTooLarge {
                overlap,
                max: max_tokens,
            });
        }
        Ok(Self {
            max_tokens,
            overlap,
            tokenizer,
        })
    }

    pub fn from_config(config: &SummarizationConfig) -> Result<Self, ConfigError> {
        Self::new(config.max_chunk_tokens, config.chunk_overlap_tokens)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Split `text` into chunks. Always returns at least one chunk.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let spans = self.tokenizer.spans(text);
        let total = spans.len();

        if total <= self.max_tokens {
            return vec![Chunk {
                index: 0,
                text: text.to_string(),
                byte_range: 0..text.len(),
                token_range: 0..total,
                overlap_bytes: 0,
            }];
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.max_tokens).min(total);
            let byte_range = spans[start].start..spans[end - 1].end;
            let overlap_bytes = chunks
                .last()
                .map(|prev| prev.byte_range.end.saturating_sub(byte_range.start))
                .unwrap_or(0);

            chunks.push(Chunk {
                index: chunks.len(),
                text: text[byte_range.clone()].to_string(),
                byte_range,
                token_range: start..end,
                overlap_bytes,
            });

            if end == total {
                break;
            }
            start = end - self.overlap;
        }
        chunks
    }
}

/// Rebuild the source text from its chunks by dropping each overlap prefix.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = Chunker::new(900, 100).unwrap();
        let text = "A short paragraph that fits easily.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].overlap_bytes, 0);
    }

    #[test]
    fn exact_budget_is_a_single_chunk() {
        let chunker = Chunker::new(10, 2).unwrap();
        let text = words(10);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn empty_text_is_a_single_empty_chunk() {
        let chunker = Chunker::new(10, 2).unwrap();
        let chunks = chunker.chunk("");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "");
        assert_eq!(chunks[0].token_count(), 0);
    }

    #[test]
    fn two_thousand_tokens_make_three_overlapping_chunks() {
        let chunker = Chunker::new(900, 100).unwrap();
        let text = words(2000);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].token_range, 0..900);
        assert_eq!(chunks[1].token_range, 800..1700);
        assert_eq!(chunks[2].token_range, 1600..2000);
        for pair in chunks.windows(2) {
            assert!(pair[1].overlap_bytes > 0);
            let shared = pair[0].token_range.end - pair[1].token_range.start;
            assert_eq!(shared, 100);
            assert!(pair[0].text.ends_with(&pair[1].text[..pair[1].overlap_bytes]));
        }
    }

    #[test]
    fn chunks_respect_the_token_budget() {
        let tokenizer = WhitespaceTokenizer;
        for (max, overlap) in [(5, 0), (5, 4), (7, 3), (64, 16)] {
            let chunker = Chunker::new(max, overlap).unwrap();
            let text = words(333);
            for chunk in chunker.chunk(&text) {
                assert!(chunk.token_count() <= max);
                assert!(tokenizer.count(&chunk.text) <= max);
            }
        }
    }

    #[test]
    fn chunks_are_substrings_at_their_range() {
        let chunker = Chunker::new(4, 1).unwrap();
        let text = "  one two  three\nfour five\tsix seven eight nine ";
        for chunk in chunker.chunk(text) {
            assert_eq!(&text[chunk.byte_range.clone()], chunk.text);
        }
    }

    #[test]
    fn reconstruction_is_exact() {
        let chunker = Chunker::new(6, 2).unwrap();
        let text = "\n Lorem ipsum dolor sit amet,  consectetur\tadipiscing elit, sed do \
                    eiusmod tempor incididunt ut labore et dolore magna aliqua.  ";
        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn reconstruction_without_overlap_is_plain_concat() {
        let chunker = Chunker::new(3, 0).unwrap();
        let text = words(10);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.overlap_bytes == 0));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn indices_follow_document_order() {
        let chunker = Chunker::new(3, 1).unwrap();
        let chunks = chunker.chunk(&words(20));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn degenerate_overlap_is_rejected() {
        assert!(matches!(
            Chunker::new(100, 100),
            Err(ConfigError::OverlapTooLarge { .. })
        ));
        assert!(matches!(
            Chunker::new(100, 250),
            Err(ConfigError::OverlapTooLarge { .. })
        ));
        assert!(matches!(Chunker::new(0, 0), Err(ConfigError::ZeroChunkSize)));
    }
}
