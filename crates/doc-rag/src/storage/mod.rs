//! Storage module for persistent data storage
//!
//! Provides the SQLite-based chunk collection behind the local vector store.

mod collection;

pub use collection::{cosine_similarity, ChunkCollection, ManifestEntry};
