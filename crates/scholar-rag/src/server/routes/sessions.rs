//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatTurn, SessionSummary};

/// POST /api/sessions - Start a session
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSummary>)> {
    let session = state.create_session()?;
    let summary = session.lock().await.summary();
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/sessions/:id - Session summary
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>> {
    let session = state.session(id)?;
    let summary = session.lock().await.summary();
    Ok(Json(summary))
}

/// DELETE /api/sessions/:id - End a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.remove_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/:id/history - Chat history, oldest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatTurn>>> {
    let session = state.session(id)?;
    let history = session.lock().await.history().to_vec();
    Ok(Json(history))
}

/// POST /api/sessions/:id/reset - Clear uploads, index and history
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>> {
    let session = state.session(id)?;
    let mut session = session.lock().await;
    session.reset(state.pipeline().default_settings());
    Ok(Json(session.summary()))
}
