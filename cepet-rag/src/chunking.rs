//! Text splitting for ingestion.
//!
//! [`RecursiveChunker`] splits hierarchically by paragraphs, lines,
//! sentences, then words, and finally by characters, merging the pieces back
//! into chunks of at most `chunk_size` characters where consecutive chunks
//! share up to `chunk_overlap` characters. Sizes are counted in characters,
//! not bytes, so accented text is never cut inside a code point.

use std::collections::VecDeque;

/// A strategy for splitting a document's text into chunk bodies.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunk bodies.
    ///
    /// Returns an empty `Vec` if the text is empty or whitespace only.
    fn split(&self, text: &str) -> Vec<String>;
}

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use cepet_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let bodies = chunker.split(&text);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: characters shared by consecutive chunks; clamped below `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some((position, separator)) =
            separators.iter().enumerate().find(|(_, sep)| text.contains(**sep))
        else {
            return split_by_chars(text, self.chunk_size, self.chunk_overlap);
        };
        let remaining = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            chunks.extend(self.split_recursive(piece, remaining));
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks
    }

    /// Greedily pack pieces into windows, carrying a tail of at most
    /// `chunk_overlap` characters into the next window.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, window.iter().copied().collect::<String>());
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }
        if !window.is_empty() {
            push_trimmed(&mut chunks, window.iter().copied().collect::<String>());
        }

        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &SEPARATORS)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-window splitting with overlap, used when no separator applies.
fn split_by_chars(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        push_trimmed(&mut chunks, chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
