//! Word-boundary text segmentation.
//!
//! Splits input text into [`Chunk`]s of at most `max_length` characters.
//! A window that would end inside a word is trimmed back to the last
//! whitespace it contains, so chunks end on word boundaries. A single token
//! longer than `max_length` cannot be split that way and is emitted whole.
//!
//! Lengths are counted in characters, not bytes. Concatenating the chunks in
//! order always reproduces the input exactly.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET_SEGMENT};

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 10_000;

/// A contiguous piece of the input text, submitted as one remote job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the sequence, starting at 0.
    pub index: usize,
    /// Byte offset of this chunk in the original text.
    pub offset: usize,
    /// The chunk text, whitespace included.
    pub text: String,
}

impl Chunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into word-aligned chunks of bounded length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    max_length: usize,
}

impl Segmenter {
    /// Creates a segmenter producing chunks of at most `max_length` characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `max_length` is zero.
    pub fn new(max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::invalid_input("max chunk length must be positive"));
        }
        Ok(Self { max_length })
    }

    /// Maximum chunk length in characters.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Splits `text` into chunks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `text` is empty.
    pub fn segment(&self, text: &str) -> Result<Vec<Chunk>> {
        if text.is_empty() {
            return Err(Error::invalid_input("text must not be empty"));
        }

        let mut chunks = Vec::new();
        let mut offset = 0;

        while offset < text.len() {
            let rest = &text[offset..];
            let len = self.next_chunk_len(rest);
            chunks.push(Chunk {
                index: chunks.len(),
                offset,
                text: rest[..len].to_owned(),
            });
            offset += len;
        }

        tracing::debug!(
            target: TRACING_TARGET_SEGMENT,
            text_bytes = text.len(),
            max_length = self.max_length,
            chunks = chunks.len(),
            "Segmented input text"
        );

        Ok(chunks)
    }

    /// Byte length of the chunk taken from the front of `rest`.
    ///
    /// `rest` is never empty and the returned length is always positive.
    fn next_chunk_len(&self, rest: &str) -> usize {
        let window_end = rest
            .char_indices()
            .nth(self.max_length)
            .map_or(rest.len(), |(i, _)| i);

        if window_end == rest.len() {
            return window_end;
        }

        let window = &rest[..window_end];
        let last = window.chars().next_back();
        let next = rest[window_end..].chars().next();

        let cuts_word = matches!(
            (last, next),
            (Some(last), Some(next)) if !last.is_whitespace() && !next.is_whitespace()
        );
        if !cuts_word {
            return window_end;
        }

        match window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
            Some((i, c)) => i + c.len_utf8(),
            None => {
                // The window is the head of a single over-length token.
                let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                tracing::trace!(
                    target: TRACING_TARGET_SEGMENT,
                    token_bytes = token_end,
                    max_length = self.max_length,
                    "Emitting over-length token whole"
                );
                token_end
            }
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_CHUNK_LENGTH,
        }
    }
}

/// Splits `text` into chunks of at most `max_length` characters.
///
/// Shorthand for [`Segmenter::new`] followed by [`Segmenter::segment`].
pub fn segment(text: &str, max_length: usize) -> Result<Vec<Chunk>> {
    Segmenter::new(max_length)?.segment(text)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ErrorKind;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_hello_world() {
        let chunks = segment("hello world", 5).unwrap();
        assert_eq!(texts(&chunks), vec!["hello", " ", "world"]);
        assert_eq!(chunks.concat_text(), "hello world");
    }

    #[test]
    fn test_single_character() {
        let chunks = segment("a", 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_empty_text() {
        let err = segment("", 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_zero_max_length() {
        let err = segment("hello", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_text_shorter_than_limit() {
        let chunks = segment("The quick brown fox.", 100).unwrap();
        assert_eq!(texts(&chunks), vec!["The quick brown fox."]);
    }

    #[test]
    fn test_trims_back_to_whitespace() {
        let chunks = segment("the quick brown fox", 12).unwrap();
        assert_eq!(texts(&chunks), vec!["the quick ", "brown fox"]);
        assert_eq!(chunks[1].offset, 10);
    }

    #[test]
    fn test_window_ending_before_whitespace_is_kept() {
        let chunks = segment("abc def", 3).unwrap();
        assert_eq!(texts(&chunks), vec!["abc", " ", "def"]);
    }

    #[test]
    fn test_over_length_token_is_emitted_whole() {
        let chunks = segment("supercalifragilistic is long", 5).unwrap();
        assert_eq!(chunks[0].text, "supercalifragilistic");
        assert_eq!(chunks.concat_text(), "supercalifragilistic is long");
    }

    #[test]
    fn test_over_length_token_at_end() {
        let chunks = segment("a bcdefghij", 4).unwrap();
        assert_eq!(texts(&chunks), vec!["a ", "bcdefghij"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "héé ñññ";
        let chunks = segment(text, 4).unwrap();
        assert_eq!(texts(&chunks), vec!["héé ", "ñññ"]);
    }

    #[test]
    fn test_indices_are_contiguous() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = segment(text, 9).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(&text[chunk.offset..chunk.offset + chunk.text.len()], chunk.text);
        }
    }

    #[test]
    fn test_default_segmenter() {
        assert_eq!(Segmenter::default().max_length(), DEFAULT_MAX_CHUNK_LENGTH);
    }

    trait ConcatText {
        fn concat_text(&self) -> String;
    }

    impl ConcatText for Vec<Chunk> {
        fn concat_text(&self) -> String {
            self.iter().map(|c| c.text.as_str()).collect()
        }
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_text(
            text in "[a-zé☃ \n\t]{1,200}",
            max_length in 1usize..40,
        ) {
            let chunks = segment(&text, max_length).unwrap();
            prop_assert_eq!(chunks.concat_text(), text);
        }

        #[test]
        fn prop_chunks_respect_max_length(
            text in "[a-z ]{1,200}",
            max_length in 1usize..40,
        ) {
            for chunk in segment(&text, max_length).unwrap() {
                let unsplittable = !chunk.text.contains(char::is_whitespace);
                prop_assert!(chunk.char_len() <= max_length || unsplittable);
            }
        }

        #[test]
        fn prop_boundaries_fall_on_whitespace(
            text in "[a-z ]{1,200}",
            max_length in 1usize..40,
        ) {
            let chunks = segment(&text, max_length).unwrap();
            for pair in chunks.windows(2) {
                let last = pair[0].text.chars().next_back().unwrap();
                let first = pair[1].text.chars().next().unwrap();
                prop_assert!(last.is_whitespace() || first.is_whitespace());
            }
        }
    }
}
