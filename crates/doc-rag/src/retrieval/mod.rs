//! Embedding-backed retrieval over the chunk collection

mod manager;

pub use manager::VectorStoreManager;
