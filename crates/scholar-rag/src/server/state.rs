//! Application state for the RAG server

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::RagPipeline;
use crate::providers::{OpenAiProviderFactory, ProviderFactory};
use crate::session::Session;

/// A session guarded so its actions run one at a time
pub type SharedSession = Arc<Mutex<Session>>;

/// A live session and when it last served a request
struct SessionEntry {
    session: SharedSession,
    last_active: RwLock<Instant>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: Arc<RagConfig>,
    /// Process/Ask orchestration
    pipeline: RagPipeline,
    /// Live sessions
    sessions: DashMap<Uuid, SessionEntry>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by the OpenAI API
    pub fn new(config: RagConfig, env_api_key: Option<String>) -> Self {
        let providers = Arc::new(OpenAiProviderFactory::new(
            config.openai.clone(),
            config.models.temperature,
        ));
        Self::with_providers(config, providers, env_api_key)
    }

    /// Create state with a custom provider factory
    pub fn with_providers(
        config: RagConfig,
        providers: Arc<dyn ProviderFactory>,
        env_api_key: Option<String>,
    ) -> Self {
        let config = Arc::new(config);
        let pipeline = RagPipeline::new(Arc::clone(&config), providers, env_api_key);

        tracing::info!(
            "Application state initialized (embedding default: {}, LLM default: {}, environment key: {})",
            config.models.default_embedding_model(),
            config.models.default_llm_model(),
            if pipeline.has_env_api_key() { "set" } else { "not set" }
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                sessions: DashMap::new(),
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Start a new session with default settings.
    ///
    /// Idle sessions are dropped first; fails once `max_sessions` are live.
    pub fn create_session(&self) -> Result<SharedSession> {
        self.evict_idle_sessions();

        let limit = self.inner.config.server.max_sessions;
        if self.inner.sessions.len() >= limit {
            tracing::warn!("Session limit reached ({} active)", limit);
            return Err(Error::SessionLimit(limit));
        }

        let session = Session::new(self.inner.pipeline.default_settings());
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.inner.sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&shared),
                last_active: RwLock::new(Instant::now()),
            },
        );
        tracing::info!("Session {} created ({} active)", id, self.inner.sessions.len());
        Ok(shared)
    }

    /// Look up a session and mark it active
    pub fn session(&self, id: Uuid) -> Result<SharedSession> {
        let entry = self
            .inner
            .sessions
            .get(&id)
            .ok_or(Error::SessionNotFound(id))?;
        *entry.last_active.write() = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    /// Drop sessions idle for at least `session_idle_secs`.
    ///
    /// A session still held by an in-flight request is kept. Returns how many were dropped.
    pub fn evict_idle_sessions(&self) -> usize {
        let ttl = Duration::from_secs(self.inner.config.server.session_idle_secs);
        let mut evicted = 0;
        self.inner.sessions.retain(|id, entry| {
            let idle = entry.last_active.read().elapsed() >= ttl;
            let in_use = Arc::strong_count(&entry.session) > 1;
            if idle && !in_use {
                tracing::info!("Session {} expired after {:?} idle", id, ttl);
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Drop a session and everything it holds
    pub fn remove_session(&self, id: Uuid) -> Result<()> {
        self.inner
            .sessions
            .remove(&id)
            .map(|_| tracing::info!("Session {} removed", id))
            .ok_or(Error::SessionNotFound(id))
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}
