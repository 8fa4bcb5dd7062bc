//! Paragraph-boundary text chunker.
//!
//! Splits extracted text into [`Chunk`]s that respect a `max_tokens` limit.
//! Splitting happens on paragraph boundaries (`\n\n`) first; paragraphs that
//! are too long on their own are hard-split at a newline or space.
//!
//! Each chunk gets a fresh UUID (the fragment identifier once stored) and a
//! SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Approximate chars-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// Split text into chunks with contiguous indices starting at 0.
///
/// Whitespace-only input produces no chunks.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<Chunk> {
    let max_chars = max_tokens.max(1) * CHARS_PER_TOKEN;
    let mut chunks = Vec::new();
    let mut current_buf = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            push_chunk(&mut chunks, &current_buf);
            current_buf.clear();
        }

        if trimmed.len() > max_chars {
            hard_split(&mut chunks, trimmed, max_chars);
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        push_chunk(&mut chunks, &current_buf);
    }

    chunks
}

fn hard_split(chunks: &mut Vec<Chunk>, paragraph: &str, max_chars: usize) {
    let mut remaining = paragraph;
    while !remaining.is_empty() {
        let mut split_at = remaining.len().min(max_chars);
        while !remaining.is_char_boundary(split_at) {
            split_at -= 1;
        }
        if split_at == 0 {
            // A single char wider than the budget; take it whole.
            split_at = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
        }
        let actual_split = if split_at < remaining.len() {
            remaining[..split_at]
                .rfind('\n')
                .or_else(|| remaining[..split_at].rfind(' '))
                .filter(|&pos| pos > 0)
                .map(|pos| pos + 1)
                .unwrap_or(split_at)
        } else {
            split_at
        };
        let piece = remaining[..actual_split].trim();
        if !piece.is_empty() {
            push_chunk(chunks, piece);
        }
        remaining = &remaining[actual_split..];
    }
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: &str) {
    let index = chunks.len() as i64;
    chunks.push(make_chunk(index, text));
}

fn make_chunk(index: i64, text: &str) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash: hash_text(text),
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("", 700).is_empty());
        assert!(chunk_text("  \n\n \n\n\t", 700).is_empty());
    }

    #[test]
    fn paragraphs_under_limit_are_merged() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text(text, 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn paragraphs_over_limit_split_with_contiguous_indices() {
        // max_tokens=5 => max_chars=20
        let text = "This is paragraph one.\n\nThis is paragraph two.\n\nThis is paragraph three.";
        let chunks = chunk_text(text, 5);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert!(!c.text.is_empty());
        }
    }

    #[test]
    fn long_paragraph_splits_on_spaces() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = chunk_text(text, 3); // 12 chars
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 12, "chunk too long: {:?}", c.text);
        }
        let rejoined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_char() {
        let text = "é".repeat(50);
        let chunks = chunk_text(&text, 1); // 4 bytes => two chars each
        let total: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(total, text);
    }

    #[test]
    fn ids_are_unique_and_hashes_deterministic() {
        let a = chunk_text("Alpha\n\nBeta", 1);
        let b = chunk_text("Alpha\n\nBeta", 1);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_ne!(x.id, y.id);
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.text, y.text);
        }
    }
}
