//! Source format detection and plain-text extraction.
//!
//! Only UTF-8 text and Markdown are decoded here. PDF and DOCX parsing belongs
//! to an external extraction service; for those formats [`extract_text`]
//! fails with [`RagError::UnsupportedFormat`] and callers fall back to
//! [`extraction_placeholder`], which the chunker treats like any other text.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// File extensions accepted for upload.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".pdf", ".docx", ".txt", ".md"];

/// The format of an uploaded source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `application/pdf`
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// Plain text or Markdown.
    PlainText,
}

impl SourceFormat {
    /// Detect the format from a file name or path. Unknown extensions are
    /// treated as plain text.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::PlainText,
        }
    }

    /// The MIME type recorded for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::PlainText => "text/plain",
        }
    }
}

/// Returns `true` if the file's extension is one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Read a plain-text or Markdown file. Invalid UTF-8 is replaced lossily.
///
/// # Errors
///
/// Returns [`RagError::UnsupportedFileType`] if the extension is not in
/// [`SUPPORTED_EXTENSIONS`], [`RagError::UnsupportedFormat`] for PDF and DOCX
/// files and [`RagError::Extraction`] if the file cannot be read.
pub async fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !is_supported(path) {
        return Err(RagError::UnsupportedFileType { file: path.display().to_string() });
    }
    match SourceFormat::from_path(path) {
        SourceFormat::PlainText => {
            let bytes = tokio::fs::read(path).await.map_err(|e| RagError::Extraction {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        SourceFormat::Pdf | SourceFormat::Docx => Err(RagError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase(),
        }),
    }
}

/// Stand-in text stored when a document's text could not be extracted.
pub fn extraction_placeholder(name: &str) -> String {
    format!("[Could not extract text from {name}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(SourceFormat::from_path("paper.PDF"), SourceFormat::Pdf);
        assert_eq!(SourceFormat::from_path("notes.docx"), SourceFormat::Docx);
        assert_eq!(SourceFormat::from_path("readme.md"), SourceFormat::PlainText);
        assert_eq!(SourceFormat::from_path("data.csv"), SourceFormat::PlainText);
        assert_eq!(SourceFormat::from_path("no_extension"), SourceFormat::PlainText);
        assert_eq!(SourceFormat::Pdf.mime_type(), "application/pdf");
    }

    #[test]
    fn supported_extensions() {
        assert!(is_supported("a.md"));
        assert!(is_supported("b.TXT"));
        assert!(!is_supported("c.csv"));
        assert!(!is_supported("plain"));
    }

    #[tokio::test]
    async fn reads_text_files_and_rejects_binary_formats() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.md");
        std::fs::write(&notes, "# Heading\n\nBody text.").unwrap();
        assert_eq!(extract_text(&notes).await.unwrap(), "# Heading\n\nBody text.");

        let pdf = dir.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        let err = extract_text(&pdf).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { ref extension } if extension == "pdf"));

        let csv = dir.path().join("table.csv");
        std::fs::write(&csv, "a,b\n1,2").unwrap();
        assert!(matches!(extract_text(&csv).await, Err(RagError::UnsupportedFileType { .. })));

        let missing = dir.path().join("missing.txt");
        assert!(matches!(extract_text(&missing).await, Err(RagError::Extraction { .. })));
    }
}
