//! API routes for the RAG server

pub mod chat;
pub mod sessions;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::{CHUNK_OVERLAP_RANGE, CHUNK_SIZE_RANGE, TOP_K_RANGE};
use crate::retrieval::VECTORSTORE_TYPE;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/info", get(info))
        .route("/settings", get(settings))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/history", get(sessions::get_history))
        .route("/sessions/:id/reset", post(sessions::reset_session))
        // Upload - with larger body limit for files
        .route(
            "/sessions/:id/upload",
            post(upload::upload_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Build and chat
        .route("/sessions/:id/process", post(chat::process_documents))
        .route("/sessions/:id/ask", post(chat::ask_question))
}

/// GET /api/settings - Defaults, bounds and model choices for the controls
async fn settings(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    Json(json!({
        "defaults": config.default_settings(),
        "bounds": {
            "chunk_size": { "min": CHUNK_SIZE_RANGE.start(), "max": CHUNK_SIZE_RANGE.end() },
            "chunk_overlap": { "min": CHUNK_OVERLAP_RANGE.start(), "max": CHUNK_OVERLAP_RANGE.end() },
            "top_k": { "min": TOP_K_RANGE.start(), "max": TOP_K_RANGE.end() },
        },
        "embedding_models": config.models.embedding_models,
        "llm_models": config.models.llm_models,
        "env_api_key_configured": state.pipeline().has_env_api_key(),
        "api_key_env": config.openai.api_key_env,
    }))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "scholar-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions about uploaded PDFs with cited source passages",
        "vectorstore_type": VECTORSTORE_TYPE,
        "active_sessions": state.session_count(),
        "endpoints": {
            "GET /api/settings": "Defaults, bounds and model choices",
            "POST /api/sessions": "Start a session",
            "GET /api/sessions/:id": "Session summary",
            "DELETE /api/sessions/:id": "End a session",
            "POST /api/sessions/:id/upload": "Stage PDF files (multipart field 'files')",
            "POST /api/sessions/:id/process": "Extract, chunk and index staged files",
            "POST /api/sessions/:id/ask": "Ask a question about the indexed documents",
            "GET /api/sessions/:id/history": "Chat history",
            "POST /api/sessions/:id/reset": "Clear files, index and history"
        }
    }))
}
