//! Ollama-based providers for embeddings and LLM

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{LlmConfig, OllamaConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{http_client, RetryPolicy};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(ollama: &OllamaConfig, llm: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(llm)?,
            base_url: ollama.base_url.trim_end_matches('/').to_string(),
            temperature: llm.temperature,
            retry: RetryPolicy::from_config(llm),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let url = url.as_str();

        self.retry
            .run(move || async move {
                let response = self
                    .client
                    .post(url)
                    .json(&EmbedRequest {
                        model,
                        prompt: text,
                    })
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let body: EmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                if body.embedding.is_empty() {
                    return Err(Error::embedding(format!(
                        "Model '{}' returned an empty embedding",
                        model
                    )));
                }

                Ok(body.embedding)
            })
            .await
    }

    /// Complete a prompt with retry
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let url = url.as_str();

        self.retry
            .run(move || async move {
                let response = self
                    .client
                    .post(url)
                    .json(&GenerateRequest {
                        model,
                        prompt,
                        stream: false,
                        options: GenerateOptions {
                            temperature: self.temperature,
                        },
                    })
                    .send()
                    .await
                    .map_err(|e| Error::generation(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::generation(format!(
                        "Generation failed: HTTP {}",
                        response.status()
                    )));
                }

                let body: GenerateResponse = response.json().await.map_err(|e| {
                    Error::generation(format!("Failed to parse generation response: {}", e))
                })?;

                Ok(body.response)
            })
            .await
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    pub fn new(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build embedder and LLM sharing one Ollama client
pub fn ollama_providers(
    ollama: &OllamaConfig,
    llm: &LlmConfig,
) -> Result<(OllamaEmbedder, OllamaLlm)> {
    let client = Arc::new(OllamaClient::new(ollama, llm)?);
    Ok((
        OllamaEmbedder::new(Arc::clone(&client), ollama.embed_model.clone()),
        OllamaLlm::new(client, ollama.generate_model.clone()),
    ))
}
