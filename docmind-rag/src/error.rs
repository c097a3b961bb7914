//! Error types for the `docmind-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in retrieval operations.
///
/// Empty outcomes (no candidates, no matching chunks, a blank query) are not
/// errors; they surface as empty rankings or the [`NO_CONTEXT`](crate::NO_CONTEXT)
/// sentinel.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied argument violated a basic precondition.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The file's extension is not one of the accepted upload types.
    #[error("Unsupported file type: {file} (accepted: .pdf, .docx, .txt, .md)")]
    UnsupportedFileType {
        /// The rejected file name.
        file: String,
    },

    /// The source format cannot be decoded by this crate.
    #[error("Unsupported source format: .{extension}")]
    UnsupportedFormat {
        /// The file extension that was rejected, without the leading dot.
        extension: String,
    },

    /// Reading a source file failed.
    #[error("Text extraction failed for {}: {message}", path.display())]
    Extraction {
        /// The file being read.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the chunk store backend.
    #[error("Chunk store error ({backend}): {message}")]
    ChunkStoreError {
        /// The chunk store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A JSON (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
