//! Provider abstractions for embeddings and answer generation
//!
//! Providers are created per request from the caller's credential, so a
//! session never holds a key longer than one action.

pub mod embedding;
pub mod llm;
pub mod openai;

use std::sync::Arc;

use crate::config::ApiKey;
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use openai::{ChatMessage, OpenAiChat, OpenAiClient, OpenAiEmbedder, OpenAiProviderFactory};

/// Creates providers bound to a credential and model
pub trait ProviderFactory: Send + Sync {
    /// Embedding provider for `model`
    fn embedder(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn EmbeddingProvider>>;

    /// Completion provider for `model`
    fn llm(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn LlmProvider>>;
}
