//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Allowed chunk sizes in characters
pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 500..=2000;
/// Allowed chunk overlaps in characters (must also stay below the chunk size)
pub const CHUNK_OVERLAP_RANGE: RangeInclusive<usize> = 0..=500;
/// Allowed number of retrieved chunks per question
pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=10;

/// Default environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// OpenAI-compatible API configuration
    pub openai: OpenAiConfig,
    /// Model choices offered to users
    pub models: ModelConfig,
    /// Default chunking configuration
    pub chunking: ChunkingConfig,
    /// Default retrieval configuration
    pub retrieval: RetrievalConfig,
    /// PDF ingestion configuration
    pub ingestion: IngestionConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file; missing sections fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: RagConfig = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Load from an explicit path, else the user config dir if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Default config file location (`~/.config/scholar-rag/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scholar-rag").join("config.toml"))
    }

    /// Apply `SCHOLAR_RAG_HOST`, `SCHOLAR_RAG_PORT` and `OPENAI_BASE_URL`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("SCHOLAR_RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SCHOLAR_RAG_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SCHOLAR_RAG_PORT: {}", port),
            }
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
        self
    }

    /// Sanity-check values that would make every request fail
    pub fn check(&self) -> Result<()> {
        if self.models.embedding_models.is_empty() || self.models.llm_models.is_empty() {
            return Err(Error::Config("Model lists must not be empty".to_string()));
        }
        if self.server.max_sessions == 0 {
            return Err(Error::Config("server.max_sessions must be at least 1".to_string()));
        }
        if self.openai.embedding_batch_size == 0 {
            return Err(Error::Config("openai.embedding_batch_size must be at least 1".to_string()));
        }
        self.default_settings()
            .validate(&self.models)
            .map_err(|e| Error::Config(format!("Invalid defaults: {}", e)))
    }

    /// Settings a new session starts with
    pub fn default_settings(&self) -> RagSettings {
        RagSettings {
            embedding_model: self.models.default_embedding_model().to_string(),
            llm_model: self.models.default_llm_model().to_string(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
            top_k: self.retrieval.top_k,
        }
    }
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
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Live sessions allowed at once
    pub max_sessions: usize,
    /// Seconds without a request before a session is dropped
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            max_sessions: 64,
            session_idle_secs: 3600,
        }
    }
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures (rate limit, 5xx, network)
    pub max_retries: u32,
    /// Texts per embeddings request
    pub embedding_batch_size: usize,
    /// Environment variable consulted when no key is entered
    pub api_key_env: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 120,
            max_retries: 0,
            embedding_batch_size: 64,
            api_key_env: OPENAI_API_KEY_ENV.to_string(),
        }
    }
}

/// Model choices; the first entry of each list is the default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Embedding models users may select
    pub embedding_models: Vec<String>,
    /// Completion models users may select
    pub llm_models: Vec<String>,
    /// Sampling temperature for answers
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_models: vec![
                "text-embedding-3-small".to_string(),
                "text-embedding-3-large".to_string(),
                "text-embedding-ada-002".to_string(),
            ],
            llm_models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "gpt-4-turbo".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
            temperature: 0.7,
        }
    }
}

impl ModelConfig {
    /// Default embedding model
    pub fn default_embedding_model(&self) -> &str {
        self.embedding_models.first().map(String::as_str).unwrap_or("text-embedding-3-small")
    }

    /// Default completion model
    pub fn default_llm_model(&self) -> &str {
        self.llm_models.first().map(String::as_str).unwrap_or("gpt-4o-mini")
    }

    /// Reject embedding models outside the offered list
    pub fn check_embedding_model(&self, model: &str) -> Result<()> {
        if self.embedding_models.iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "Unknown embedding model '{}' (choose one of: {})",
                model,
                self.embedding_models.join(", ")
            )))
        }
    }

    /// Reject completion models outside the offered list
    pub fn check_llm_model(&self, model: &str) -> Result<()> {
        if self.llm_models.iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "Unknown LLM model '{}' (choose one of: {})",
                model,
                self.llm_models.join(", ")
            )))
        }
    }
}

/// Text chunking defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Characters of each source shown before truncation
    pub snippet_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            snippet_length: 200,
        }
    }
}

/// PDF ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Wait limit for extracting a single PDF, in seconds
    pub extraction_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: 60,
        }
    }
}

/// User-adjustable settings for one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSettings {
    /// Embedding model used at build and query time
    pub embedding_model: String,
    /// Completion model used for answers
    pub llm_model: String,
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Chunk overlap in characters
    pub chunk_overlap: usize,
    /// Chunks retrieved per question
    pub top_k: usize,
}

impl RagSettings {
    /// Reject out-of-range values before anything uses them
    pub fn validate(&self, models: &ModelConfig) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        validate_top_k(self.top_k)?;
        models.check_embedding_model(&self.embedding_model)?;
        models.check_llm_model(&self.llm_model)?;
        Ok(())
    }
}

/// Check chunk size/overlap bounds and `overlap < size`
pub fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if !CHUNK_SIZE_RANGE.contains(&chunk_size) {
        return Err(Error::validation(format!(
            "chunk_size must be between {} and {}, got {}",
            CHUNK_SIZE_RANGE.start(),
            CHUNK_SIZE_RANGE.end(),
            chunk_size
        )));
    }
    if !CHUNK_OVERLAP_RANGE.contains(&chunk_overlap) {
        return Err(Error::validation(format!(
            "chunk_overlap must be between {} and {}, got {}",
            CHUNK_OVERLAP_RANGE.start(),
            CHUNK_OVERLAP_RANGE.end(),
            chunk_overlap
        )));
    }
    if chunk_overlap >= chunk_size {
        return Err(Error::validation(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}

/// Check the top-K bound
pub fn validate_top_k(top_k: usize) -> Result<()> {
    if TOP_K_RANGE.contains(&top_k) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "top_k must be between {} and {}, got {}",
            TOP_K_RANGE.start(),
            TOP_K_RANGE.end(),
            top_k
        )))
    }
}

/// An API credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Raw key for the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Pick the credential: an explicitly entered key wins over the environment key.
///
/// Blank values count as absent. No key at all is a configuration error.
pub fn resolve_api_key(explicit: Option<&str>, environment: Option<&str>) -> Result<ApiKey> {
    [explicit, environment]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(|key| ApiKey(key.to_string()))
        .ok_or_else(|| {
            Error::Config(
                "An OpenAI API key is required: enter one or set the API key environment variable"
                    .to_string(),
            )
        })
}
