//! Core types for the RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, PageRecord, ScoredChunk, UploadedDocument};
pub use query::QueryRequest;
pub use response::{
    Citation, CollectionStats, HealthReport, QueryOutcome, QueryResult, ResetOutcome,
    UploadOutcome,
};
