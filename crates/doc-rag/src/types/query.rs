//! Query request types

use serde::{Deserialize, Serialize};

/// Query request for RAG search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Restrict retrieval to chunks of this source file name
    #[serde(default)]
    pub source_filter: Option<String>,
}

impl QueryRequest {
    /// Source filter with blank values treated as absent
    pub fn effective_filter(&self) -> Option<&str> {
        self.source_filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_optional() {
        let req: QueryRequest = serde_json::from_str(r#"{"question": "What is RAG?"}"#).unwrap();
        assert_eq!(req.question, "What is RAG?");
        assert!(req.effective_filter().is_none());
    }

    #[test]
    fn test_blank_filter_is_ignored() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "q", "source_filter": "  "}"#).unwrap();
        assert!(req.effective_filter().is_none());

        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "q", "source_filter": "a.pdf"}"#).unwrap();
        assert_eq!(req.effective_filter(), Some("a.pdf"));
    }
}
