//! doc-rag: question answering over uploaded PDFs with page-level citations
//!
//! PDFs are split into overlapping chunks tagged with their source file and
//! page, embedded through a pluggable provider (Ollama or OpenAI) and kept in a
//! persistent SQLite-backed collection. Questions are answered by retrieving
//! the closest chunks and prompting an LLM to cite `[Source: file, Page: n]`.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod rag;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use rag::DocumentRag;
pub use types::{
    Chunk, Citation, CollectionStats, QueryOutcome, QueryRequest, QueryResult, ResetOutcome,
    ScoredChunk, UploadOutcome, UploadedDocument,
};
