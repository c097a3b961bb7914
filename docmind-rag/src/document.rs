//! Data types for documents, chunks, and scored results.

use serde::{Deserialize, Serialize};

/// A source document with its extracted plain text.
///
/// Owned by the persistence layer; the retrieval core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// The full extracted text.
    pub text: String,
}

impl Document {
    /// Create a document from its parts.
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), text: text.into() }
    }
}

/// A passage of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The parent document's display name, copied for citation.
    pub document_name: String,
    /// The passage text.
    pub content: String,
    /// Position within the parent document's chunk sequence, 0-based and contiguous.
    pub chunk_index: usize,
}

/// A [`Chunk`] paired with its relevance score against one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The relevance score (higher is more relevant, always positive once ranked).
    pub score: f64,
}
