//! File upload endpoint

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{UploadReport, UploadedFile};

/// POST /api/sessions/:id/upload - Stage files from the `files` multipart field
pub async fn upload_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>> {
    let session = state.session(id)?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }

        // Get filename
        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return Err(Error::validation("Uploaded file has no filename")),
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Failed to read '{}': {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        files.push(UploadedFile::new(filename, data));
    }

    if files.is_empty() {
        return Err(Error::validation("No files were uploaded"));
    }

    let report = session.lock().await.upload(files);
    Ok(Json(report))
}
