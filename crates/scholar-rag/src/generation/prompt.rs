//! Prompt templates for grounded answers

use crate::retrieval::ScoredChunk;
use crate::types::Citation;

/// Reply the model is told to give when the context has no answer
pub const NOT_FOUND_REPLY: &str = "I couldn't find that information in the uploaded documents";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from search results, one numbered block per chunk
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                result.chunk.source.format_citation(),
                result.chunk.content
            ));
        }

        context
    }

    /// Build the system message carrying the grounding rules and context
    pub fn build_system_prompt(context: &str, citations: &[Citation]) -> String {
        format!(
            r#"You are a helpful research assistant. Use the following pieces of context from academic papers to answer the question.

Important instructions:
- Only use information from the provided context to answer the question
- If you don't know the answer based on the context, say '{not_found}'
- When citing information, mention the source like 'According to the paper...' or 'Based on the document...'
- Be precise and scholarly in your responses
- If the context contains page numbers, reference them in your answer

Context:
{context}
Sources:
{sources}"#,
            not_found = NOT_FOUND_REPLY,
            context = context,
            sources = Self::format_sources_list(citations),
        )
    }

    /// Format sources list for the prompt
    fn format_sources_list(citations: &[Citation]) -> String {
        citations
            .iter()
            .map(|c| format!("[{}] {}, Page {}", c.rank, c.filename, c.page_number))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource};
    use uuid::Uuid;

    fn scored(content: &str, page: u32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(
                Uuid::new_v4(),
                content.to_string(),
                ChunkSource::pdf("attention.pdf".to_string(), page, 3),
                0,
            ),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_build_context_tags_sources() {
        let context = PromptBuilder::build_context(&[
            scored("Multi-head attention.", 2),
            scored("Positional encodings.", 3),
        ]);
        assert!(context.starts_with("[1] attention.pdf, Page 2\n\nMulti-head attention."));
        assert!(context.contains("[2] attention.pdf, Page 3\n\nPositional encodings."));
    }

    #[test]
    fn test_system_prompt_contains_rules_and_context() {
        let results = [scored("Multi-head attention.", 2)];
        let citations: Vec<Citation> = results
            .iter()
            .enumerate()
            .map(|(i, r)| Citation::from_chunk(&r.chunk, r.similarity, i + 1, 200))
            .collect();
        let prompt =
            PromptBuilder::build_system_prompt(&PromptBuilder::build_context(&results), &citations);

        assert!(prompt.contains("Only use information from the provided context"));
        assert!(prompt.contains(NOT_FOUND_REPLY));
        assert!(prompt.contains("Multi-head attention."));
        assert!(prompt.contains("[1] attention.pdf, Page 2"));
    }
}
