//! Process and ask endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, ChatTurn, ProcessReport, ProcessRequest};

/// POST /api/sessions/:id/process - Build the index from all staged files
pub async fn process_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessReport>> {
    let session = state.session(id)?;
    let mut session = session.lock().await;
    let report = state.pipeline().process(&mut session, request).await?;
    Ok(Json(report))
}

/// POST /api/sessions/:id/ask - Answer a question with sources
pub async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ChatTurn>> {
    let session = state.session(id)?;
    let mut session = session.lock().await;
    let turn = state.pipeline().ask(&mut session, request).await?;
    Ok(Json(turn))
}
