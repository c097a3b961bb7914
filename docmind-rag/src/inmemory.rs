//! In-memory chunk store.
//!
//! [`InMemoryChunkStore`] keeps documents in a `BTreeMap` behind a
//! `tokio::sync::RwLock`. It is suitable for development, testing, and the
//! command-line tool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::chunkstore::ChunkStore;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

const BACKEND: &str = "InMemory";

#[derive(Debug, Clone)]
struct StoredDocument {
    document: Document,
    chunks: Vec<Chunk>,
}

/// An in-memory chunk store keyed by document ID.
///
/// Iteration follows key order, so candidates come back sorted by
/// `document_id` and then `chunk_index` without an explicit sort per query.
#[derive(Debug, Default)]
pub struct InMemoryChunkStore {
    documents: RwLock<BTreeMap<String, StoredDocument>>,
}

impl InMemoryChunkStore {
    /// Create a new empty in-memory chunk store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored document by ID.
    pub async fn document(&self, document_id: &str) -> Option<Document> {
        self.documents.read().await.get(document_id).map(|stored| stored.document.clone())
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn insert(&self, document: &Document, chunks: &[Chunk]) -> Result<()> {
        if let Some(stray) = chunks.iter().find(|chunk| chunk.document_id != document.id) {
            return Err(RagError::ChunkStoreError {
                backend: BACKEND.to_string(),
                message: format!(
                    "chunk '{}' belongs to document '{}', not '{}'",
                    stray.id, stray.document_id, document.id
                ),
            });
        }

        let mut chunks = chunks.to_vec();
        chunks.sort_by_key(|chunk| chunk.chunk_index);

        let mut documents = self.documents.write().await;
        documents.insert(document.id.clone(), StoredDocument { document: document.clone(), chunks });
        Ok(())
    }

    async fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let documents = self.documents.read().await;
        Ok(documents.values().flat_map(|stored| stored.chunks.iter().cloned()).collect())
    }

    async fn chunks_for_documents(&self, document_ids: &[String]) -> Result<Vec<Chunk>> {
        if document_ids.is_empty() {
            return self.all_chunks().await;
        }
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(id, _)| document_ids.contains(*id))
            .flat_map(|(_, stored)| stored.chunks.iter().cloned())
            .collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(document_id).is_some())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.read().await.len())
    }
}
