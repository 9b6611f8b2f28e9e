//! Process and Ask actions over a session

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{resolve_api_key, validate_top_k, ApiKey, RagConfig, RagSettings};
use crate::error::{Error, Result};
use crate::generation::{query_terms, PromptBuilder};
use crate::ingestion::{IngestPipeline, PdfParser, TextChunker};
use crate::providers::ProviderFactory;
use crate::retrieval::VectorIndex;
use crate::session::Session;
use crate::types::{AskRequest, ChatTurn, Citation, ProcessReport, ProcessRequest};

/// Orchestrates ingestion, indexing and answering for sessions
#[derive(Clone)]
pub struct RagPipeline {
    config: Arc<RagConfig>,
    providers: Arc<dyn ProviderFactory>,
    /// Key read from the environment at startup
    env_api_key: Option<String>,
}

impl RagPipeline {
    /// Create a pipeline
    pub fn new(
        config: Arc<RagConfig>,
        providers: Arc<dyn ProviderFactory>,
        env_api_key: Option<String>,
    ) -> Self {
        Self {
            config,
            providers,
            env_api_key,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Whether a non-blank environment key is available
    pub fn has_env_api_key(&self) -> bool {
        self.env_api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// Default settings for new sessions
    pub fn default_settings(&self) -> RagSettings {
        self.config.default_settings()
    }

    /// Entered key first, then the environment key; the error names the configured variable
    fn resolve_key(&self, explicit: Option<&str>) -> Result<ApiKey> {
        resolve_api_key(explicit, self.env_api_key.as_deref()).map_err(|_| {
            Error::Config(format!(
                "An OpenAI API key is required: enter one or set {}",
                self.config.openai.api_key_env
            ))
        })
    }

    /// Build a fresh index from every staged upload.
    ///
    /// Settings and the credential are checked before any file is read or any
    /// service is called. On failure the session keeps its previous index.
    pub async fn process(&self, session: &mut Session, request: ProcessRequest) -> Result<ProcessReport> {
        let start = Instant::now();

        let settings = request.settings.unwrap_or_else(|| session.settings().clone());
        settings.validate(&self.config.models)?;

        if session.uploads().is_empty() {
            return Err(Error::InvalidState(
                "Upload at least one PDF before processing".to_string(),
            ));
        }

        let api_key = self.resolve_key(request.api_key.as_deref())?;
        let embedder = self.providers.embedder(&api_key, &settings.embedding_model)?;

        tracing::info!(
            "Session {}: processing {} files (chunk_size={}, overlap={}, model={})",
            session.id(),
            session.uploads().len(),
            settings.chunk_size,
            settings.chunk_overlap,
            settings.embedding_model
        );

        let ingest = IngestPipeline::new(
            PdfParser::new(Duration::from_secs(self.config.ingestion.extraction_timeout_secs)),
            TextChunker::new(settings.chunk_size, settings.chunk_overlap)?,
        );
        let files = session.uploads().to_vec();
        let outcome = tokio::task::spawn_blocking(move || ingest.ingest(&files))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let mut chunks = outcome.chunks;
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
            tracing::error!("Session {}: embedding failed, index unchanged: {}", session.id(), e);
            Error::index_build(e)
        })?;

        if embeddings.len() != chunks.len() {
            return Err(Error::index_build(Error::VectorIndex(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            ))));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let index = VectorIndex::build(chunks, embedder.model()).map_err(Error::index_build)?;
        let info = index.info();

        // Prepare the generator before committing so a failure leaves the prior index in place
        self.providers.llm(&api_key, &settings.llm_model).map_err(|e| {
            tracing::error!("Session {}: answer generator unavailable, index unchanged: {}", session.id(), e);
            e
        })?;

        session.commit_index(index, outcome.documents, outcome.reports.clone(), settings.clone());
        session.mark_ready();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Session {}: indexed {} chunks ({} dims) in {}ms",
            session.id(),
            info.num_chunks,
            info.dimensions,
            processing_time_ms
        );

        Ok(ProcessReport {
            files: outcome.reports,
            index: info,
            settings,
            warnings: outcome.warnings,
            processing_time_ms,
        })
    }

    /// Answer a question from the active index.
    ///
    /// The returned sources are exactly the retrieved chunks. Nothing is
    /// recorded when any step fails.
    pub async fn ask(&self, session: &mut Session, request: AskRequest) -> Result<ChatTurn> {
        let start = Instant::now();

        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(Error::validation("Question must not be empty"));
        }

        let index = session.index().cloned().ok_or_else(|| {
            Error::InvalidState("Process documents before asking questions".to_string())
        })?;

        let top_k = request.top_k.unwrap_or(session.settings().top_k);
        validate_top_k(top_k)?;
        let llm_model = request
            .llm_model
            .unwrap_or_else(|| session.settings().llm_model.clone());
        self.config.models.check_llm_model(&llm_model)?;

        if let Some(requested) = request.embedding_model.as_deref() {
            if requested != index.embedding_model() {
                return Err(Error::query(Error::EmbeddingModelMismatch {
                    index_model: index.embedding_model().to_string(),
                    query_model: requested.to_string(),
                }));
            }
        }

        let api_key = self.resolve_key(request.api_key.as_deref())?;
        let embedder = self.providers.embedder(&api_key, index.embedding_model())?;
        let llm = self.providers.llm(&api_key, &llm_model)?;

        let query_embedding = embedder.embed(&question).await.map_err(|e| {
            tracing::error!("Session {}: question embedding failed: {}", session.id(), e);
            Error::query(e)
        })?;

        let results = index
            .search(&query_embedding, embedder.model(), top_k)
            .map_err(Error::query)?;

        let terms = query_terms(&question);
        let term_refs: Vec<&str> = terms.iter().map(String::as_str).collect();
        let sources: Vec<Citation> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut citation = Citation::from_chunk(
                    &r.chunk,
                    r.similarity,
                    i + 1,
                    self.config.retrieval.snippet_length,
                );
                citation.highlight_terms(&term_refs);
                citation
            })
            .collect();

        let context = PromptBuilder::build_context(&results);
        let answer = llm
            .generate_answer(&question, &context, &sources)
            .await
            .map_err(|e| {
                tracing::error!("Session {}: answer generation failed: {}", session.id(), e);
                Error::query(e)
            })?;

        let turn = ChatTurn {
            id: uuid::Uuid::new_v4(),
            question,
            answer,
            sources,
            llm_model: llm.model().to_string(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            created_at: chrono::Utc::now(),
        };

        tracing::info!(
            "Session {}: answered with {} sources in {}ms",
            session.id(),
            turn.sources.len(),
            turn.processing_time_ms
        );

        session.record_turn(turn.clone());
        Ok(turn)
    }
}
