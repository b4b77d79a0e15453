//! Configuration for the document RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Backend provider for embeddings and generation
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation settings shared by all backends
    pub llm: LlmConfig,
    /// Ollama backend configuration
    pub ollama: OllamaConfig,
    /// OpenAI-compatible backend configuration
    pub openai: OpenAiConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Processing configuration
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai.api_key = key;
            }
        }
        if let Ok(backend) = std::env::var("DOC_RAG_BACKEND") {
            match backend.to_lowercase().as_str() {
                "ollama" => self.backend = BackendProvider::Ollama,
                "openai" => self.backend = BackendProvider::OpenAi,
                other => tracing::warn!("Ignoring unknown DOC_RAG_BACKEND value: {}", other),
            }
        }
        if let Ok(dir) = std::env::var("DOC_RAG_PERSIST_DIRECTORY") {
            if !dir.is_empty() {
                self.vector_db.persist_directory = PathBuf::from(dir);
            }
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            if !url.is_empty() {
                self.ollama.base_url = url;
            }
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be greater than 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.chunking.separators.is_empty() {
            return Err(Error::Config("chunking.separators must not be empty".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be greater than 0".into()));
        }
        if self.backend == BackendProvider::OpenAi && self.openai.api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI backend selected but no API key is configured (set OPENAI_API_KEY)".into(),
            ));
        }
        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server for embeddings and generation
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible API
    #[serde(rename = "openai")]
    OpenAi,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Break points in priority order; "" means a hard character cut
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to be used
    pub similarity_threshold: f32,
    /// Drop results below `similarity_threshold` (off: always return top-k)
    pub apply_similarity_threshold: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: 0.7,
            apply_similarity_threshold: false,
        }
    }
}

/// Generation settings shared by all backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds, doubled on every attempt
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2".to_string(),
        }
    }
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL including the version segment
    pub base_url: String,
    /// API key (usually supplied through OPENAI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Chat model name
    pub chat_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            embedding_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-4".to_string(),
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the collection database
    pub persist_directory: PathBuf,
    /// Name of the collection
    pub collection_name: String,
}

impl VectorDbConfig {
    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.persist_directory.join("collections.sqlite3")
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        // Use absolute path so the store does not move with the working directory
        let persist_directory = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("doc-rag");

        Self {
            persist_directory,
            collection_name: "document_collection".to_string(),
        }
    }
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Timeout for extracting and chunking a single PDF in seconds
    pub extraction_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: 120,
        }
    }
}
