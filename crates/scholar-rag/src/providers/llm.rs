//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Citation;

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `OpenAiChat`: OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer given a question, the retrieved context and its citations
    async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        citations: &[Citation],
    ) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
