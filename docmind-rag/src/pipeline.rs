//! Retrieval pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates ingestion (chunk → store) and queries
//! (fetch candidates → score and rank → assemble context) by composing a
//! [`Chunker`] and a [`ChunkStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docmind_rag::{InMemoryChunkStore, RagConfig, RagPipeline, RetrievalRequest};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .chunk_store(Arc::new(InMemoryChunkStore::new()))
//!     .build()?;
//!
//! pipeline.ingest(&document).await?;
//! let retrieval = pipeline.query(&RetrievalRequest::new("what is photosynthesis?")).await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::{Chunker, ParagraphChunker};
use crate::chunkstore::ChunkStore;
use crate::config::RagConfig;
use crate::context::{assemble_context, cited_sources};
use crate::document::{Chunk, Document, ScoredChunk};
use crate::error::{RagError, Result};
use crate::scorer::{LexicalScorer, validate_top_k};

/// A question to answer from stored documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalRequest {
    /// The user's question.
    pub query: String,
    /// Restrict candidates to these documents. Empty means every document.
    #[serde(default)]
    pub document_ids: Vec<String>,
    /// Overrides the configured `top_k`. Negative values are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
}

impl RetrievalRequest {
    /// A request over all documents with the configured `top_k`.
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), document_ids: Vec::new(), top_k: None }
    }

    /// Restrict the request to the given documents.
    pub fn with_document_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.document_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Override the number of chunks returned.
    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// The outcome of a query: ranked chunks, the prompt context built from them
/// and the distinct source documents to cite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Retrieval {
    /// Ranked chunks, best first.
    pub chunks: Vec<ScoredChunk>,
    /// Prompt-ready context, or [`NO_CONTEXT`](crate::NO_CONTEXT).
    pub context: String,
    /// Document names in rank order, without duplicates.
    pub sources: Vec<String>,
}

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    chunk_store: Arc<dyn ChunkStore>,
    chunker: Arc<dyn Chunker>,
    scorer: LexicalScorer,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the chunk store.
    pub fn chunk_store(&self) -> &Arc<dyn ChunkStore> {
        &self.chunk_store
    }

    /// Ingest a single document: chunk → store.
    ///
    /// Returns the chunks that were stored. A document whose text yields no
    /// chunks is still recorded, with an empty chunk list.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if storage fails, including the
    /// document ID in the error message.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let chunks = self.chunker.chunk(document);

        self.chunk_store.insert(document, &chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "insert failed during ingestion");
            RagError::PipelineError(format!("insert failed for document '{}': {e}", document.id))
        })?;

        info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Ingest multiple documents.
    ///
    /// Returns all chunks that were stored across all documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] on the first document that fails.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for document in documents {
            all_chunks.extend(self.ingest(document).await?);
        }
        Ok(all_chunks)
    }

    /// Answer a request: fetch candidates → score and rank → assemble context.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if the request's `top_k` is
    /// negative and [`RagError::PipelineError`] if fetching candidates fails.
    pub async fn query(&self, request: &RetrievalRequest) -> Result<Retrieval> {
        let top_k = match request.top_k {
            Some(top_k) => validate_top_k(top_k)?,
            None => self.config.top_k,
        };

        let candidates =
            self.chunk_store.chunks_for_documents(&request.document_ids).await.map_err(|e| {
                error!(error = %e, "failed to fetch candidate chunks");
                RagError::PipelineError(format!("candidate fetch failed: {e}"))
            })?;

        let chunks = self.scorer.rank(&request.query, &candidates, top_k);
        let context = assemble_context(&chunks);
        let sources = cited_sources(&chunks);

        info!(
            candidate_count = candidates.len(),
            result_count = chunks.len(),
            context_chars = context.len(),
            "query completed"
        );

        Ok(Retrieval { chunks, context, sources })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config` and `chunk_store` are required. Without an explicit chunker the
/// pipeline uses a [`ParagraphChunker`] built from the config.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    chunk_store: Option<Arc<dyn ChunkStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the chunk store backend.
    pub fn chunk_store(mut self, store: Arc<dyn ChunkStore>) -> Self {
        self.chunk_store = Some(store);
        self
    }

    /// Replace the default paragraph chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let chunk_store = self
            .chunk_store
            .ok_or_else(|| RagError::ConfigError("chunk_store is required".to_string()))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(ParagraphChunker::from_config(&config)),
        };
        let scorer = LexicalScorer::from_config(&config);

        Ok(RagPipeline { config, chunk_store, chunker, scorer })
    }
}
