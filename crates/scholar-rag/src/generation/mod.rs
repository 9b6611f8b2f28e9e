//! Prompt construction and citation handling for grounded answers

pub mod citation;
pub mod prompt;

pub use citation::{highlight_snippet, query_terms, truncate_snippet};
pub use prompt::{PromptBuilder, NOT_FOUND_REPLY};
