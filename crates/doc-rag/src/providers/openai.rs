//! OpenAI-compatible providers for embeddings and chat completions

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{LlmConfig, OpenAiConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{http_client, RetryPolicy};

/// Maximum inputs sent in one embeddings request
const EMBEDDING_BATCH_SIZE: usize = 100;

/// OpenAI API client with bearer authentication and retry
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(openai: &OpenAiConfig, llm: &LlmConfig) -> Result<Self> {
        if openai.api_key.is_empty() {
            return Err(Error::Config("OpenAI API key is not configured".into()));
        }

        Ok(Self {
            client: http_client(llm)?,
            base_url: openai.base_url.trim_end_matches('/').to_string(),
            api_key: openai.api_key.clone(),
            temperature: llm.temperature,
            retry: RetryPolicy::from_config(llm),
        })
    }

    /// Check that the API answers with the configured key
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed a batch of texts, results in input order
    pub async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let url = url.as_str();

        self.retry
            .run(move || async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&EmbeddingsRequest { model, input })
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::embedding(format!(
                        "Embedding failed: HTTP {}: {}",
                        status, body
                    )));
                }

                let mut body: EmbeddingsResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                if body.data.len() != input.len() {
                    return Err(Error::embedding(format!(
                        "Expected {} embeddings, got {}",
                        input.len(),
                        body.data.len()
                    )));
                }

                body.data.sort_by_key(|d| d.index);
                Ok(body.data.into_iter().map(|d| d.embedding).collect())
            })
            .await
    }

    /// Single-turn chat completion
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let url = url.as_str();

        self.retry
            .run(move || async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&ChatRequest {
                        model,
                        messages: [ChatMessage {
                            role: "user",
                            content: prompt,
                        }],
                        temperature: self.temperature,
                    })
                    .send()
                    .await
                    .map_err(|e| Error::generation(format!("Completion request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::generation(format!(
                        "Completion failed: HTTP {}: {}",
                        status, body
                    )));
                }

                let body: ChatResponse = response.json().await.map_err(|e| {
                    Error::generation(format!("Failed to parse completion response: {}", e))
                })?;

                body.choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| Error::generation("Completion response has no content"))
            })
            .await
    }
}

/// OpenAI embedding provider
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: Arc<OpenAiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.client.embed(&self.model, &[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            embeddings.extend(self.client.embed(&self.model, batch).await?);
        }
        Ok(embeddings)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// OpenAI chat model provider
pub struct OpenAiLlm {
    client: Arc<OpenAiClient>,
    model: String,
}

impl OpenAiLlm {
    pub fn new(client: Arc<OpenAiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.complete(&self.model, prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build embedder and LLM sharing one OpenAI client
pub fn openai_providers(
    openai: &OpenAiConfig,
    llm: &LlmConfig,
) -> Result<(OpenAiEmbedder, OpenAiLlm)> {
    let client = Arc::new(OpenAiClient::new(openai, llm)?);
    Ok((
        OpenAiEmbedder::new(Arc::clone(&client), openai.embedding_model.clone()),
        OpenAiLlm::new(client, openai.chat_model.clone()),
    ))
}
