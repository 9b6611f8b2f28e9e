//! OpenAI-compatible client for embeddings and chat completions

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error};

use crate::config::{ApiKey, OpenAiConfig};
use crate::error::{Error, Result, ServiceErrorKind};
use crate::generation::PromptBuilder;
use crate::types::Citation;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::ProviderFactory;

const PROVIDER_NAME: &str = "openai";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// One message of a chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: &'static str,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenAI API client with optional retry of transient failures
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer credential
    api_key: ApiKey,
    /// Maximum retries
    max_retries: u32,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: &OpenAiConfig, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    /// Retry a request with exponential backoff while the failure is transient
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    let transient = e.service_kind().map(|k| k.is_transient()).unwrap_or(false);
                    if !transient || attempt >= self.max_retries {
                        return Err(e);
                    }
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// POST a JSON body and decode the JSON reply, classifying failures with `fail`
    async fn post_json<B, R, F>(&self, path: &str, body: &B, fail: F) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
        F: Fn(ServiceErrorKind, String) -> Error,
    {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER_NAME, error = %e, "request failed");
                fail(ServiceErrorKind::Network, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER_NAME, %status, "API error");
            return Err(fail(
                ServiceErrorKind::from_status(status),
                format!("API returned {}: {}", status, detail),
            ));
        }

        response.json::<R>().await.map_err(|e| {
            error!(provider = PROVIDER_NAME, error = %e, "failed to parse response");
            fail(ServiceErrorKind::Decode, format!("failed to parse response: {}", e))
        })
    }

    /// Embed a batch of texts, returning vectors in input order
    pub async fn embeddings(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER_NAME,
            batch_size = input.len(),
            model = %model,
            "embedding batch"
        );

        let request = EmbeddingRequest { model, input };
        let mut response: EmbeddingResponse = self
            .retry_request(|| self.post_json("embeddings", &request, |k, m| Error::embedding(k, m)))
            .await?;

        if response.data.len() != input.len() {
            return Err(Error::embedding(
                ServiceErrorKind::Decode,
                format!("expected {} vectors, got {}", input.len(), response.data.len()),
            ));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Run a chat completion and return the first choice's text
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String> {
        debug!(provider = PROVIDER_NAME, model = %model, messages = messages.len(), "chat completion");

        let request = ChatRequest {
            model,
            messages,
            temperature,
        };
        let response: ChatResponse = self
            .retry_request(|| self.post_json("chat/completions", &request, |k, m| Error::llm(k, m)))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::llm(ServiceErrorKind::Decode, "response contained no answer"))
    }
}

/// Embedding provider backed by [`OpenAiClient`]
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.client.embeddings(&self.model, batch).await?);
        }
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

/// Chat-completion provider backed by [`OpenAiClient`]
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiChat {
    async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        citations: &[Citation],
    ) -> Result<String> {
        let messages = [
            ChatMessage::system(PromptBuilder::build_system_prompt(context, citations)),
            ChatMessage::user(question),
        ];
        self.client
            .chat_completion(&self.model, &messages, self.temperature)
            .await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Builds OpenAI providers for a credential and model
#[derive(Debug, Clone)]
pub struct OpenAiProviderFactory {
    config: OpenAiConfig,
    temperature: f32,
}

impl OpenAiProviderFactory {
    /// Create a factory from API settings and the answer temperature
    pub fn new(config: OpenAiConfig, temperature: f32) -> Self {
        Self { config, temperature }
    }
}

impl ProviderFactory for OpenAiProviderFactory {
    fn embedder(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn EmbeddingProvider>> {
        let client = Arc::new(OpenAiClient::new(&self.config, api_key.clone())?);
        Ok(Arc::new(OpenAiEmbedder::from_client(
            client,
            model,
            self.config.embedding_batch_size,
        )))
    }

    fn llm(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn LlmProvider>> {
        let client = Arc::new(OpenAiClient::new(&self.config, api_key.clone())?);
        Ok(Arc::new(OpenAiChat::from_client(client, model, self.temperature)))
    }
}
