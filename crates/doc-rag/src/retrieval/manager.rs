//! Vector store manager: embeds chunks and queries, delegates storage

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::storage::ManifestEntry;
use crate::types::{Chunk, ScoredChunk};

/// Embeds text with one provider and stores it in one collection
pub struct VectorStoreManager {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    config: RetrievalConfig,
}

impl VectorStoreManager {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Embed and store chunks, returning their ids in input order
    ///
    /// Every chunk is embedded before anything is written, so a provider
    /// failure leaves the collection untouched.
    pub async fn add(&self, chunks: Vec<Chunk>) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<(Chunk, Vec<f32>)> = chunks.into_iter().zip(embeddings).collect();
        let ids = self.store.insert(entries).await?;

        tracing::info!("Added {} chunks to {}", ids.len(), self.store.name());
        Ok(ids)
    }

    /// Chunks most similar to `query`, at most `k`, optionally from one source
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let mut results = self.store.search(&query_embedding, k, source_filter).await?;

        if self.config.apply_similarity_threshold {
            let threshold = self.config.similarity_threshold;
            let before = results.len();
            results.retain(|r| r.similarity >= threshold);
            if results.len() < before {
                tracing::debug!(
                    "Dropped {} results below similarity {}",
                    before - results.len(),
                    threshold
                );
            }
        }

        Ok(results)
    }

    /// Remove every chunk from the collection
    pub async fn delete_all(&self) -> Result<usize> {
        self.store.delete_all().await
    }

    /// Number of stored chunks; 0 when the store cannot be read
    pub async fn count(&self) -> usize {
        match self.store.len().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Failed to count chunks in {}: {}", self.store.name(), e);
                0
            }
        }
    }

    /// Documents stored in the collection, oldest first
    pub async fn manifest(&self) -> Result<Vec<ManifestEntry>> {
        self.store.manifest().await
    }
}
