//! Provider abstractions for embeddings, LLM and vector storage
//!
//! This module provides trait-based abstractions that allow switching between
//! local (Ollama) and hosted (OpenAI) backends.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod openai;
mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use ollama::{ollama_providers, OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::{openai_providers, OpenAiClient, OpenAiEmbedder, OpenAiLlm};
pub use retry::RetryPolicy;
pub use vector_store::VectorStoreProvider;
