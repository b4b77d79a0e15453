//! PDF ingestion: page extraction and recursive chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{cleanup_pdf_text, PdfExtractor};
pub use processor::{DocumentProcessor, ProcessedDocument};
