//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`ParagraphChunker`], which
//! packs paragraphs greedily into word-bounded chunks with a word-level overlap
//! between neighbours. Paragraphs far larger than the target are split on
//! sentence boundaries instead.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MIN_CHUNK_CHARS, RagConfig,
};
use crate::document::{Chunk, Document};

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("paragraph pattern is valid"));

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence pattern is valid"));

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no usable text. Chunk
    /// indices are contiguous and start at zero.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Packs paragraphs into chunks of roughly `chunk_size` words.
///
/// When the next paragraph would push the running word count past
/// `chunk_size`, the current chunk is closed and the next one is seeded with
/// its last `chunk_overlap` words. A paragraph longer than 1.5 × `chunk_size`
/// words is split by sentence with no overlap, and the running buffer is
/// discarded afterwards. Chunks whose trimmed length is `min_chunk_chars`
/// characters or fewer are dropped.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use docmind_rag::{Chunker, Document, ParagraphChunker};
///
/// let chunker = ParagraphChunker::default();
/// let chunks = chunker.chunk(&Document::new("doc-1", "notes.md", text));
/// ```
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_chars: usize,
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl ParagraphChunker {
    /// Create a new `ParagraphChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — target number of words per chunk
    /// * `chunk_overlap` — number of words repeated at the start of the following chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap, min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS }
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
            .with_min_chunk_chars(config.min_chunk_chars)
    }

    /// Override the noise threshold for tiny chunks.
    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Split raw text into chunk contents, in document order.
    pub fn split(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        let normalized = EXCESS_BLANK_LINES.replace_all(&normalized, "\n\n");
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_words = 0;
        let mut paragraph_count = 0;

        for paragraph in PARAGRAPH_BREAK.split(normalized) {
            paragraph_count += 1;
            let word_count = paragraph.split_whitespace().count();

            if current_words + word_count > self.chunk_size && !current.is_empty() {
                let closed = current.trim();
                let overlap = tail_words(closed, self.chunk_overlap);
                let seed = if overlap.is_empty() {
                    paragraph.to_string()
                } else {
                    format!("{}\n\n{paragraph}", overlap.join(" "))
                };
                current_words = overlap.len() + word_count;
                chunks.push(closed.to_string());
                current = seed;
            } else {
                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(paragraph);
                current_words += word_count;
            }

            if self.is_oversized(word_count) {
                debug!(words = word_count, "splitting oversized paragraph by sentence");
                chunks.extend(self.split_sentences(paragraph));
                current.clear();
                current_words = 0;
            }
        }

        let tail = current.trim();
        if !tail.is_empty() {
            chunks.push(tail.to_string());
        }

        let emitted = chunks.len();
        chunks.retain(|chunk| chunk.chars().count() > self.min_chunk_chars);
        debug!(paragraph_count, emitted, kept = chunks.len(), "split text into chunks");
        chunks
    }

    fn is_oversized(&self, word_count: usize) -> bool {
        // word_count > 1.5 * chunk_size
        word_count * 2 > self.chunk_size * 3
    }

    /// Greedy sentence packing without overlap.
    fn split_sentences(&self, paragraph: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut consumed = 0;
        for found in SENTENCE.find_iter(paragraph) {
            sentences.push(found.as_str().trim());
            consumed = found.end();
        }
        // Unterminated trailing text is kept as a sentence of its own.
        let rest = paragraph[consumed..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_words = 0;

        // Sentences are trimmed, so a sentence's leading space neither counts as
        // a word nor doubles the single-space separator.
        for sentence in sentences {
            let word_count = sentence.split_whitespace().count();
            if current_words + word_count > self.chunk_size && !current.is_empty() {
                chunks.push(current.trim().to_string());
                current = sentence.to_string();
                current_words = word_count;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
                current_words += word_count;
            }
        }

        let tail = current.trim();
        if !tail.is_empty() {
            chunks.push(tail.to_string());
        }
        chunks
    }
}

/// The last `n` whitespace-delimited words of `text`.
fn tail_words(text: &str, n: usize) -> Vec<&str> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].to_vec()
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                id: format!("{}_{chunk_index}", document.id),
                document_id: document.id.clone(),
                document_name: document.name.clone(),
                content,
                chunk_index,
            })
            .collect();
        debug!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
        chunks
    }
}

/// Split text with the default 600-word target and 100-word overlap.
pub fn chunk_text(text: &str) -> Vec<String> {
    ParagraphChunker::default().split(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(prefix: &str, words: usize) -> String {
        (0..words).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_and_blank_text_yield_no_chunks() {
        assert!(chunk_text("").is_empty());
        assert!(chunk_text("  \n\n\r\n  ").is_empty());
    }

    #[test]
    fn small_document_fits_in_one_chunk() {
        let text = "Alpha reviews photosynthesis in plants.\n\nBeta discusses cellular respiration.";
        let chunks = ParagraphChunker::new(10_000, 100).split(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("Alpha reviews photosynthesis in plants."));
        assert!(chunks[0].contains("Beta discusses cellular respiration."));
    }

    #[test]
    fn paragraph_exactly_at_target_is_one_chunk() {
        let text = paragraph("word", 600);
        let chunks = chunk_text(&text);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn overflow_seeds_next_chunk_with_word_overlap() {
        let text = [paragraph("a", 300), paragraph("b", 300), paragraph("c", 300)].join("\n\n");
        let chunks = chunk_text(&text);
        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].split_whitespace().count(), 600);
        assert!(chunks[0].ends_with("b299"));

        let second: Vec<&str> = chunks[1].split_whitespace().collect();
        assert_eq!(second.len(), 400);
        assert_eq!(second[0], "b200");
        assert_eq!(second[99], "b299");
        assert_eq!(second[100], "c0");
        assert!(chunks[1].contains("b299\n\nc0"));
    }

    #[test]
    fn normalizes_line_endings_and_blank_runs() {
        let text = "First paragraph talks about chlorophyll.\r\n\r\n\r\n\r\nSecond paragraph covers stomata.";
        let chunks = chunk_text(text);
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].contains('\r'));
        assert!(!chunks[0].contains("\n\n\n"));
        assert!(chunks[0].contains("chlorophyll.\n\nSecond"));
    }

    #[test]
    fn drops_chunks_at_or_below_fifty_chars() {
        assert!(chunk_text("Too short to be useful.").is_empty());
        let exactly_fifty = "x".repeat(50);
        assert!(chunk_text(&exactly_fifty).is_empty());
        let fifty_one = "x".repeat(51);
        assert_eq!(chunk_text(&fifty_one), vec![fifty_one]);
    }

    #[test]
    fn oversized_paragraph_splits_by_sentence_and_resets_buffer() {
        let sentences = [
            "Sunlight drives the light reactions.",
            "Water molecules are split there.",
            "Oxygen escapes through the stomata.",
            "Carbon fixation happens afterwards.",
            "Sugars are finally exported onward.",
        ];
        let text = format!(
            "Intro paragraph words here.\n\n{}\n\nClosing thoughts end here.",
            sentences.join(" ")
        );
        let chunker = ParagraphChunker::new(10, 2).with_min_chunk_chars(10);
        let chunks = chunker.split(&text);

        assert_eq!(
            chunks,
            vec![
                "Intro paragraph words here.".to_string(),
                format!("{} {}", sentences[0], sentences[1]),
                format!("{} {}", sentences[2], sentences[3]),
                sentences[4].to_string(),
                "Closing thoughts end here.".to_string(),
            ]
        );
    }

    #[test]
    fn unterminated_sentence_tail_is_kept() {
        let text = "One two three four. Five six seven eight. nine ten eleven twelve";
        let chunks = ParagraphChunker::new(6, 1).with_min_chunk_chars(0).split(text);
        assert_eq!(chunks.last().map(String::as_str), Some("nine ten eleven twelve"));
    }

    #[test]
    fn chunker_assigns_contiguous_indices_and_ids() {
        let text = [paragraph("a", 400), paragraph("b", 400), paragraph("c", 400)].join("\n\n");
        let document = Document::new("doc-7", "biology.txt", text);
        let chunks = ParagraphChunker::default().chunk(&document);

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.id, format!("doc-7_{i}"));
            assert_eq!(chunk.document_id, "doc-7");
            assert_eq!(chunk.document_name, "biology.txt");
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = [paragraph("x", 500), paragraph("y", 250), paragraph("z", 950)].join("\n\n");
        assert_eq!(chunk_text(&text), chunk_text(&text));
    }
}
