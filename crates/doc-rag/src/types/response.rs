//! Response types for RAG operations

use serde::{Deserialize, Serialize};

use super::document::UploadedDocument;

/// Citation of a source page used to answer a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source file name
    pub source: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Leading excerpt of the first chunk seen for this page
    pub content_preview: String,
}

/// Answer with its deduplicated citations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Model answer, verbatim
    pub answer: String,
    /// Cited pages in retrieval order
    pub sources: Vec<Citation>,
}

/// Result of an upload, success or a readable error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success {
        message: String,
        chunks_created: usize,
        document_info: UploadedDocument,
    },
    Error {
        message: String,
    },
}

impl UploadOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Result of a query, success or a readable error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryOutcome {
    Success {
        question: String,
        answer: String,
        sources: Vec<Citation>,
    },
    Error {
        message: String,
    },
}

impl QueryOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Result of a collection reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResetOutcome {
    Success { message: String },
    Error { message: String },
}

impl ResetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Collection statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Documents in the session's record list
    pub total_documents: usize,
    /// Chunks currently stored in the collection
    pub total_chunks: usize,
}

/// Reachability of the external services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub embedder: bool,
    pub llm: bool,
    pub store: bool,
}

impl HealthReport {
    pub fn is_ready(&self) -> bool {
        self.embedder && self.llm && self.store
    }
}
