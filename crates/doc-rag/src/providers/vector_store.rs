//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::storage::ManifestEntry;
use crate::types::{Chunk, ScoredChunk};

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: SQLite collection on local disk
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert chunks with their embeddings atomically, returning the assigned ids
    async fn insert(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<String>>;

    /// Search for similar chunks, best first
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Delete every chunk in the collection
    async fn delete_all(&self) -> Result<usize>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Stored documents, one entry per insert batch
    async fn manifest(&self) -> Result<Vec<ManifestEntry>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
