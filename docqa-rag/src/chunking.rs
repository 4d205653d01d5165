//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], a
//! boundary-seeking sliding window that prefers to cut at paragraph breaks,
//! then line breaks, then spaces, and falls back to a hard cut at
//! `chunk_size` characters.
//!
//! Sizes are measured in characters (Unicode scalar values), never bytes, so
//! chunk boundaries always fall on valid UTF-8 boundaries.

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separators tried in priority order when looking for a chunk boundary.
pub const DEFAULT_SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations must be deterministic and must cover the document without
/// gaps: dropping each chunk's leading `overlap` characters and concatenating
/// the rest reproduces the document text.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if the document text is empty.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Splits text into windows of at most `chunk_size` characters, preferring
/// separator boundaries, with up to `chunk_overlap` characters carried over
/// from one chunk into the next.
///
/// Each chunk inherits the document's metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, Document, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&Document::new(text))?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Vec<char>>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` using [`DEFAULT_SEPARATORS`].
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - maximum number of characters shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.chars().collect()).collect(),
        }
    }

    /// Create a chunker from the sizes in a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list. An empty list yields plain fixed-size windows.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.separators = separators
            .into_iter()
            .map(|s| s.as_ref().chars().collect::<Vec<char>>())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// Compute `(start, end, overlap)` character spans for the given text.
    fn spans(&self, chars: &[char]) -> Vec<(usize, usize, usize)> {
        let len = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;
        let mut overlap = 0;

        loop {
            let hard_end = (start + self.chunk_size).min(len);
            let end = if hard_end == len { len } else { self.find_break(chars, start, hard_end) };
            spans.push((start, end, overlap));
            if end == len {
                break;
            }
            let next = self.next_start(chars, end);
            overlap = end - next;
            start = next;
        }

        spans
    }

    /// Find where a window starting at `start` should end, given that it may
    /// extend at most to `hard_end`.
    ///
    /// The chunk must stay longer than `chunk_overlap` so the next window
    /// always starts further along.
    fn find_break(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let min_end = start + self.chunk_overlap + 1;

        for separator in &self.separators {
            let sep_len = separator.len();
            if hard_end - start < sep_len {
                continue;
            }
            let mut pos = hard_end - sep_len;
            loop {
                if chars[pos..pos + sep_len] == separator[..] {
                    let end = pos + sep_len;
                    if end >= min_end {
                        return end;
                    }
                    break;
                }
                if pos == start {
                    break;
                }
                pos -= 1;
            }
        }

        hard_end
    }

    /// Start of the chunk following one that ends at `end`.
    ///
    /// Starts `chunk_overlap` characters back, moved forward past the first
    /// whitespace in that region when real text follows it.
    fn next_start(&self, chars: &[char], end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let candidate = end - self.chunk_overlap;
        let region = &chars[candidate..end];
        region
            .iter()
            .position(|c| c.is_whitespace())
            .filter(|&ws| region[ws + 1..].iter().any(|c| !c.is_whitespace()))
            .map(|ws| candidate + ws + 1)
            .unwrap_or(candidate)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.text.is_empty() {
            return Err(RagError::InvalidInput("document is empty".to_string()));
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "invalid chunker sizes: chunk_size={}, chunk_overlap={}",
                self.chunk_size, self.chunk_overlap
            )));
        }

        let chars: Vec<char> = document.text.chars().collect();
        let chunks = self
            .spans(&chars)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end, overlap))| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), index.to_string());
                Chunk {
                    index,
                    text: chars[start..end].iter().collect(),
                    offset: start,
                    overlap,
                    metadata,
                }
            })
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn empty_document_is_invalid_input() {
        let err = RecursiveChunker::new(10, 2).chunk(&Document::new("")).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let doc = Document::new("Sales orders must be approved by a manager.");
        let chunks = RecursiveChunker::new(1000, 200).chunk(&doc).unwrap();
        assert_eq!(texts(&chunks), vec![doc.text.as_str()]);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].overlap, 0);
        assert_eq!(chunks[0].metadata.get("chunk_index").map(String::as_str), Some("0"));
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let doc = Document::new("First paragraph.\n\nSecond paragraph.");
        let chunks = RecursiveChunker::new(20, 0).chunk(&doc).unwrap();
        assert_eq!(texts(&chunks), vec!["First paragraph.\n\n", "Second paragraph."]);
        assert_eq!(chunks[1].offset, 18);
    }

    #[test]
    fn hard_cuts_without_separators() {
        let doc = Document::new("abcdefghij");
        let chunks = RecursiveChunker::new(4, 1).chunk(&doc).unwrap();
        assert_eq!(texts(&chunks), vec!["abcd", "defg", "ghij"]);
        assert!(chunks.iter().skip(1).all(|c| c.overlap == 1));
    }

    #[test]
    fn overlap_starts_on_a_word_boundary_when_possible() {
        let doc = Document::new("one two three four five six");
        let chunks = RecursiveChunker::new(12, 5).chunk(&doc).unwrap();
        assert_eq!(chunks[0].text, "one two ");
        assert_eq!(chunks[1].text, "two three ");
        assert_eq!(chunks[1].overlap, 4);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 12));
        assert!(chunks.iter().all(|c| c.overlap <= 5));
    }

    #[test]
    fn splits_on_character_boundaries() {
        let doc = Document::new("héllo wörld ünïcödé tëxt ñ");
        let chunks = RecursiveChunker::new(8, 2).chunk(&doc).unwrap();
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 8));

        let mut rebuilt = String::new();
        for chunk in &chunks {
            rebuilt.extend(chunk.text.chars().skip(chunk.overlap));
        }
        assert_eq!(rebuilt, doc.text);
    }

    #[test]
    fn inherits_document_metadata() {
        let mut doc = Document::new("alpha beta gamma delta");
        doc.metadata.insert("source".into(), "handbook".into());
        let chunks = RecursiveChunker::new(10, 2).chunk(&doc).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.metadata.get("source").map(String::as_str), Some("handbook"));
            assert_eq!(chunk.metadata.get("chunk_index"), Some(&i.to_string()));
        }
    }

    #[test]
    fn rejects_inconsistent_sizes() {
        let err = RecursiveChunker::new(5, 5).chunk(&Document::new("abc")).unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }
}
