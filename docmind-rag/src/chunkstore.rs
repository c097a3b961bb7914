//! Chunk store trait: the persistence boundary of the retrieval core.

use async_trait::async_trait;

use crate::document::{Chunk, Document};
use crate::error::Result;

/// A storage backend for documents and their chunks.
///
/// The retrieval core never mutates stored data; it reads candidate sets
/// once per query. Candidates are returned ordered by `document_id`, then
/// `chunk_index`.
///
/// # Example
///
/// ```rust,ignore
/// use docmind_rag::{ChunkStore, InMemoryChunkStore};
///
/// let store = InMemoryChunkStore::new();
/// store.insert(&document, &chunks).await?;
/// let candidates = store.chunks_for_documents(&["doc-1".to_string()]).await?;
/// ```
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a document with its chunks, replacing any earlier version.
    async fn insert(&self, document: &Document, chunks: &[Chunk]) -> Result<()>;

    /// Every stored chunk across all documents.
    async fn all_chunks(&self) -> Result<Vec<Chunk>>;

    /// Chunks of the listed documents only. An empty list means all chunks;
    /// unknown IDs are ignored.
    async fn chunks_for_documents(&self, document_ids: &[String]) -> Result<Vec<Chunk>>;

    /// Remove a document and its chunks. Returns `false` if it was not stored.
    async fn delete_document(&self, document_id: &str) -> Result<bool>;

    /// Number of stored documents.
    async fn document_count(&self) -> Result<usize>;
}
