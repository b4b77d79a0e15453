//! Page, chunk and document bookkeeping types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Text of a single PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Extracted page text
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// File the page was read from
    pub source: PathBuf,
}

/// A chunk of page text, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content
    pub content: String,
    /// File name of the source document (used in citations and filters)
    pub source: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Window index within the page, restarting at 0 for every page
    pub chunk_index: u32,
    /// Path the document was uploaded from
    pub path: PathBuf,
}

impl Chunk {
    /// Create a new chunk for a page window
    pub fn new(content: String, path: &Path, page: u32, chunk_index: u32) -> Self {
        Self {
            content,
            source: source_label(path),
            page,
            chunk_index,
            path: path.to_path_buf(),
        }
    }
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (higher is more similar)
    pub similarity: f32,
}

/// Bookkeeping entry for a successfully uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    /// Path the document was read from
    pub path: PathBuf,
    /// File name shown in citations
    pub filename: String,
    /// Number of chunks stored for the document
    pub chunk_count: usize,
    /// Collection ids of the stored chunks, in chunk order
    pub vector_ids: Vec<String>,
    /// SHA-256 of the PDF bytes (empty for records rebuilt from the collection)
    #[serde(default)]
    pub content_hash: String,
    /// Time the record was created
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// File name used to label chunks of the document at `path`
pub fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
