//! Text chunking with page tracking
//!
//! Pages are split recursively on progressively finer separators, then the
//! pieces are merged greedily into windows of at most `chunk_size` characters,
//! each window starting with up to `overlap` characters carried over from the
//! end of the previous one. Every chunk is a contiguous slice of one page.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document};

/// Separators tried in order; the empty separator splits into characters
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; the overlap must be smaller than the chunk size
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Target chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every page of a document, numbering chunks across the document
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let total_pages = doc.total_pages();
        let mut chunks = Vec::new();

        for page in doc.pages.iter().filter(|p| p.has_text()) {
            for text in self.split_text(&page.text) {
                let source = ChunkSource::pdf(doc.filename.clone(), page.page_number, total_pages);
                let index = chunks.len() as u32;
                chunks.push(Chunk::new(doc.id, text, source, index));
            }
        }

        chunks
    }

    /// Split text into overlapping windows
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting));
        }

        chunks
    }

    /// Greedily merge consecutive pieces into windows, keeping a tail for overlap
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window);

                // Drop from the front until the carried tail fits the overlap
                // and leaves room for the incoming piece
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        push_trimmed(&mut chunks, &window);
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the start of the following piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices(separator) {
        if i > start {
            pieces.push(&text[start..i]);
        }
        start = i;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Page;

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..6 {
            for s in 0..8 {
                text.push_str(&format!(
                    "Paragraph {} sentence {} discusses retrieval augmented generation. ",
                    p, s
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextChunker::new(500, 500).is_err());
        assert!(TextChunker::new(500, 600).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(500, 499).is_ok());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.split_text("  A short page of text.  ");
        assert_eq!(chunks, vec!["A short page of text.".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = sample_text();
        for (size, overlap) in [(500, 0), (500, 100), (1000, 200), (2000, 500)] {
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.split_text(&text);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(char_len(chunk) <= size, "chunk of {} chars exceeds {}", char_len(chunk), size);
            }
        }
    }

    #[test]
    fn test_chunks_are_substrings() {
        let text = sample_text();
        let chunker = TextChunker::new(500, 150).unwrap();
        for chunk in chunker.split_text(&text) {
            assert!(text.contains(&chunk));
        }
    }

    #[test]
    fn test_deterministic() {
        let text = sample_text();
        let chunker = TextChunker::new(700, 120).unwrap();
        let first = chunker.split_text(&text);
        let second = TextChunker::new(700, 120).unwrap().split_text(&text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlap_carries_text() {
        let text: String = (0..400).map(|i| format!("w{} ", i)).collect();
        let chunker = TextChunker::new(500, 100).unwrap();
        let chunks = chunker.split_text(&text);
        assert!(chunks.len() > 1);

        // The first word of each chunk also appears in the previous one
        for pair in chunks.windows(2) {
            let first = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].split_whitespace().any(|w| w == first));
        }
    }

    #[test]
    fn test_no_overlap_covers_text_once() {
        let text = "abcd ".repeat(300);
        let chunker = TextChunker::new(500, 0).unwrap();
        let chunks = chunker.split_text(&text);
        let total: usize = chunks.iter().map(|c| c.split_whitespace().count()).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(1200);
        let chunker = TextChunker::new(500, 50).unwrap();
        let chunks = chunker.split_text(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 500));
    }

    #[test]
    fn test_multibyte_lengths_in_characters() {
        let text = "é".repeat(900);
        let chunker = TextChunker::new(500, 0).unwrap();
        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(char_len(&chunks[0]), 500);
        assert_eq!(char_len(&chunks[1]), 400);
    }

    #[test]
    fn test_chunk_document_tracks_pages() {
        let doc = Document::new(
            "paper.pdf".to_string(),
            "hash".to_string(),
            100,
            vec![
                Page::new(1, "Intro page about transformers."),
                Page::new(2, ""),
                Page::new(3, "Results page with numbers."),
            ],
        );
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source.page_number, 1);
        assert_eq!(chunks[1].source.page_number, 3);
        assert_eq!(chunks[1].chunk_index, 1);
        for chunk in &chunks {
            assert_eq!(chunk.document_id, doc.id);
            assert_eq!(chunk.source.filename, "paper.pdf");
            assert_eq!(chunk.source.page_count, 3);
            let page = doc.page(chunk.source.page_number).unwrap();
            assert!(page.text.contains(&chunk.content));
        }
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(split_keeping_separator("a. b. c", ". "), vec!["a", ". b", ". c"]);
        assert_eq!(split_keeping_separator("\n\nx", "\n\n"), vec!["\n\nx"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }
}
