//! Lexical retrieval core for DocuMind document question answering.
//!
//! This crate turns extracted document text into query-relevant passages:
//! - Paragraph chunking with word-level overlap
//! - Stop-word-filtered tokenization and normalized term frequencies
//! - BM25-style scoring with exact-phrase and bigram bonuses
//! - Prompt context assembly grouped by source document
//! - A chunk store boundary and an ingest/query pipeline over it
//!
//! Everything runs in memory over the candidate set handed to each call.

pub mod chunking;
pub mod chunkstore;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod extract;
pub mod inmemory;
pub mod pipeline;
pub mod scorer;
pub mod tokenizer;

pub use chunking::{Chunker, ParagraphChunker, chunk_text};
pub use chunkstore::ChunkStore;
pub use config::{Bm25Params, RagConfig, RagConfigBuilder};
pub use context::{NO_CONTEXT, assemble_context, cited_sources};
pub use document::{Chunk, Document, ScoredChunk};
pub use error::{RagError, Result};
pub use extract::{SUPPORTED_EXTENSIONS, SourceFormat, extract_text, extraction_placeholder};
pub use inmemory::InMemoryChunkStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder, Retrieval, RetrievalRequest};
pub use scorer::{
    LexicalScorer, PreparedQuery, score_and_rank, score_and_rank_default, validate_top_k,
};
pub use tokenizer::{TermFrequencies, build_term_frequencies, tokenize};
