//! Document processing: extract pages, then chunk them

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, PageRecord};

use super::chunker::TextChunker;
use super::parser::PdfExtractor;

/// Output of processing a single PDF
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Chunks in page order, then window order
    pub chunks: Vec<Chunk>,
    /// Pages that produced text
    pub pages_with_text: usize,
    /// SHA-256 of the file bytes, hex encoded
    pub content_hash: String,
}

/// Turns PDFs into page-tagged chunks
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunker: TextChunker,
}

impl DocumentProcessor {
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Ok(Self::new(TextChunker::from_config(config)?))
    }

    /// Extract page texts from a PDF file
    pub fn extract(&self, path: &Path) -> Result<Vec<PageRecord>> {
        PdfExtractor::extract(path)
    }

    /// Chunk extracted pages
    pub fn chunk(&self, pages: &[PageRecord]) -> Vec<Chunk> {
        self.chunker.chunk_pages(pages)
    }

    /// Extract and chunk a PDF file
    pub fn process(&self, path: &Path) -> Result<ProcessedDocument> {
        let data = std::fs::read(path)?;
        self.process_bytes(&data, path)
    }

    /// Extract and chunk PDF bytes; `path` labels the chunks
    pub fn process_bytes(&self, data: &[u8], path: &Path) -> Result<ProcessedDocument> {
        let pages = PdfExtractor::extract_bytes(data, path)?;
        let chunks = self.chunk(&pages);

        tracing::debug!(
            "Processed {}: {} pages with text, {} chunks",
            path.display(),
            pages.len(),
            chunks.len()
        );

        Ok(ProcessedDocument {
            chunks,
            pages_with_text: pages.len(),
            content_hash: hex::encode(Sha256::digest(data)),
        })
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(TextChunker::default())
    }
}
