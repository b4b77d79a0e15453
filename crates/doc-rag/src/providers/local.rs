//! Local vector store backed by the SQLite chunk collection
//!
//! The collection is synchronous, so every call runs on the blocking pool.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::VectorDbConfig;
use crate::error::Result;
use crate::storage::{ChunkCollection, ManifestEntry};
use crate::types::{Chunk, ScoredChunk};

use super::vector_store::VectorStoreProvider;

/// Local vector store wrapping a [`ChunkCollection`]
pub struct LocalVectorStore {
    collection: Arc<ChunkCollection>,
}

impl LocalVectorStore {
    /// Create from an existing collection
    pub fn new(collection: Arc<ChunkCollection>) -> Self {
        Self { collection }
    }

    /// Open the configured collection under the persist directory
    pub fn from_config(config: &VectorDbConfig) -> Result<Self> {
        let collection = ChunkCollection::open(config.database_path(), &config.collection_name)?;
        tracing::info!(
            "Opened collection '{}' at {}",
            config.collection_name,
            config.database_path().display()
        );
        Ok(Self::new(Arc::new(collection)))
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<String>> {
        let collection = Arc::clone(&self.collection);
        tokio::task::spawn_blocking(move || collection.insert(&entries)).await?
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let collection = Arc::clone(&self.collection);
        let query = query_embedding.to_vec();
        let filter = source_filter.map(str::to_string);

        tokio::task::spawn_blocking(move || collection.search(&query, top_k, filter.as_deref()))
            .await?
    }

    async fn delete_all(&self) -> Result<usize> {
        let collection = Arc::clone(&self.collection);
        tokio::task::spawn_blocking(move || collection.delete_all()).await?
    }

    async fn len(&self) -> Result<usize> {
        let collection = Arc::clone(&self.collection);
        tokio::task::spawn_blocking(move || collection.len()).await?
    }

    async fn manifest(&self) -> Result<Vec<ManifestEntry>> {
        let collection = Arc::clone(&self.collection);
        tokio::task::spawn_blocking(move || collection.manifest()).await?
    }

    async fn health_check(&self) -> Result<bool> {
        let collection = Arc::clone(&self.collection);
        let reachable = tokio::task::spawn_blocking(move || collection.ping()).await?;
        Ok(reachable.is_ok())
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_roundtrip_through_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorDbConfig {
            persist_directory: dir.path().to_path_buf(),
            collection_name: "test".to_string(),
        };
        let store = LocalVectorStore::from_config(&config).unwrap();
        assert!(store.is_empty().await.unwrap());
        assert!(store.health_check().await.unwrap());

        let chunk = Chunk::new("content".into(), Path::new("/docs/a.pdf"), 1, 0);
        let ids = store.insert(vec![(chunk, vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.len().await.unwrap(), 1);

        let results = store.search(&[1.0, 0.0], 4, Some("a.pdf")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(store.manifest().await.unwrap()[0].vector_ids, ids);

        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
