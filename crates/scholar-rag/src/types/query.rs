//! Request types for session actions

use serde::{Deserialize, Serialize};

use crate::config::RagSettings;

/// Body of a Process action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Key entered by the user; falls back to the environment key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Settings for this run; the session's current settings when absent
    #[serde(default)]
    pub settings: Option<RagSettings>,
}

impl ProcessRequest {
    /// Process with explicit settings
    pub fn with_settings(settings: RagSettings) -> Self {
        Self {
            api_key: None,
            settings: Some(settings),
        }
    }

    /// Attach an explicitly entered key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Body of an Ask action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,

    /// Key entered by the user; falls back to the environment key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chunks to retrieve (1-10); the session setting when absent
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Completion model; the session setting when absent
    #[serde(default)]
    pub llm_model: Option<String>,

    /// Embedding model the caller expects; must match the index
    #[serde(default)]
    pub embedding_model: Option<String>,
}

impl AskRequest {
    /// Create a new question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Attach an explicitly entered key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Use a specific completion model
    pub fn with_llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Name the embedding model the caller expects the index to use
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }
}
