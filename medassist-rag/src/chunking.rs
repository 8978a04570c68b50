//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveCharacterSplitter`],
//! which splits text on the largest separator that still yields windows of at
//! most `chunk_size` characters: paragraph breaks first, then line breaks,
//! then spaces, then individual characters.

use std::collections::VecDeque;

use tracing::warn;

use crate::document::{CHUNK_INDEX_KEY, Document};

/// Separators tried in order, from coarsest to finest.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Chunks are plain [`Document`]s carrying the parent's metadata plus a
/// `chunk_index` entry. Embeddings are attached later by the RAG system.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Document>;

    /// Split every document, preserving input order.
    fn split(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits text recursively by a hierarchy of separators with overlap.
///
/// Lengths are measured in Unicode scalar values. A window can only exceed
/// `chunk_size` when a piece cannot be split further by any remaining
/// separator.
///
/// # Example
///
/// ```rust,ignore
/// use medassist_rag::{Chunker, RecursiveCharacterSplitter};
///
/// let splitter = RecursiveCharacterSplitter::new(1000, 200);
/// let chunks = splitter.split(&documents);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - maximum number of characters carried over between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator hierarchy.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap carried between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into trimmed, non-empty windows.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily pack pieces into windows, keeping up to `chunk_overlap`
    /// trailing characters of each window at the head of the next.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut windows = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        chunk_len = total,
                        chunk_size = self.chunk_size,
                        "created a chunk longer than the configured size"
                    );
                }
                if !current.is_empty() {
                    push_window(&mut windows, &current);
                    while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0)
                    {
                        let Some(front) = current.pop_front() else { break };
                        total -= char_len(front);
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        push_window(&mut windows, &current);
        windows
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn chunk(&self, document: &Document) -> Vec<Document> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
                Document { text, metadata }
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_window(windows: &mut Vec<String>, pieces: &VecDeque<&str>) {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        windows.push(trimmed.to_string());
    }
}

/// Split text at a separator, attaching each separator occurrence to the
/// start of the piece that follows it. An empty separator splits into
/// individual characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search_from = 0;

    while let Some(pos) = text[search_from..].find(separator) {
        let at = search_from + pos;
        if at > start {
            pieces.push(&text[start..at]);
        }
        start = at;
        search_from = at + separator.len();
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200);
        let doc = Document::new("Diabetes is a chronic condition affecting blood sugar.")
            .with_metadata("source", "diabetes.txt");

        let chunks = splitter.chunk(&doc);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Diabetes is a chronic condition affecting blood sugar.");
        assert_eq!(chunks[0].metadata.get("source").map(String::as_str), Some("diabetes.txt"));
        assert_eq!(chunks[0].metadata.get(CHUNK_INDEX_KEY).map(String::as_str), Some("0"));
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let splitter = RecursiveCharacterSplitter::new(12, 0);
        let chunks = splitter.split_text("aaaa bbbb\n\ncccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn falls_back_to_characters_for_unbroken_runs() {
        let splitter = RecursiveCharacterSplitter::new(10, 0);
        let chunks = splitter.split_text(&"x".repeat(25));
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn atomic_piece_may_exceed_size_without_character_fallback() {
        let splitter = RecursiveCharacterSplitter::new(5, 0).with_separators([" "]);
        let chunks = splitter.split_text("ab abcdefghij cd");
        assert!(chunks.contains(&"abcdefghij".to_string()));
    }

    #[test]
    fn whitespace_only_document_yields_nothing() {
        let splitter = RecursiveCharacterSplitter::new(100, 10);
        assert!(splitter.chunk(&Document::new(" \n\n ")).is_empty());
    }

    #[test]
    fn split_keeps_separator_at_start_of_following_piece() {
        assert_eq!(split_keeping_separator("a\n\n\n\nb", "\n\n"), vec!["a", "\n\n", "\n\nb"]);
        assert_eq!(split_keeping_separator("héllo", ""), vec!["h", "é", "l", "l", "o"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let splitter = RecursiveCharacterSplitter::new(6, 0);
        let chunks = splitter.split_text("ééééé ééééé");
        assert_eq!(chunks, vec!["ééééé", "ééééé"]);
    }

    #[test]
    fn chunk_indices_are_sequential_per_document() {
        let splitter = RecursiveCharacterSplitter::new(20, 5);
        let doc = Document::new("one two three four five six seven eight nine ten eleven");
        let indices: Vec<String> = splitter
            .chunk(&doc)
            .into_iter()
            .map(|c| c.metadata[CHUNK_INDEX_KEY].clone())
            .collect();
        let expected: Vec<String> = (0..indices.len()).map(|i| i.to_string()).collect();
        assert_eq!(indices, expected);
    }
}
