//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::rag::DocumentRag;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// The document session behind every route
    rag: DocumentRag,
}

impl AppState {
    /// Create new application state with providers for the configured backend
    pub async fn new(config: RagConfig) -> Result<Self> {
        let rag = DocumentRag::new(config).await?;
        Ok(Self::from_rag(rag))
    }

    /// Wrap an already assembled session
    pub fn from_rag(rag: DocumentRag) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: rag.config().clone(),
                rag,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn rag(&self) -> &DocumentRag {
        &self.inner.rag
    }
}
