//! Token boundaries used to budget chunks.

use std::ops::Range;

/// Splits text into tokens expressed as byte spans.
///
/// The returned spans must be contiguous and cover the whole input: the first
/// starts at 0, each one ends where the next begins, and the last ends at
/// `text.len()`. Text without tokens returns an empty list.
pub trait Tokenizer: Send + Sync {
    fn spans(&self, text: &str) -> Vec<Range<usize>>;

    fn count(&self, text: &str) -> usize {
        self.spans(text).len()
    }
}

/// One token per whitespace-delimited word.
///
/// A token owns its trailing whitespace; leading whitespace belongs to the first token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut starts = Vec::new();
        let mut in_word = false;
        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                in_word = false;
            } else if !in_word {
                starts.push(idx);
                in_word = true;
            }
        }

        let mut spans = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let start = if i == 0 { 0 } else { start };
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            spans.push(start..end);
        }
        spans
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_the_text() {
        let text = "  hello brave\n new   world ";
        let spans = WhitespaceTokenizer.spans(text);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans.last().unwrap().end, text.len());
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(&text[spans[0].clone()], "  hello ");
        assert_eq!(&text[spans[3].clone()], "world ");
    }

    #[test]
    fn blank_text_has_no_tokens() {
        assert!(WhitespaceTokenizer.spans("").is_empty());
        assert!(WhitespaceTokenizer.spans(" \n\t ").is_empty());
        assert_eq!(WhitespaceTokenizer.count("   "), 0);
    }

    #[test]
    fn multibyte_words_split_on_char_boundaries() {
        let text = "café naïve\u{3000}日本語";
        let spans = WhitespaceTokenizer.spans(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[2].clone()], "日本語");
        assert_eq!(WhitespaceTokenizer.count(text), 3);
    }
}
