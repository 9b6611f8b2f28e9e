//! Per-user session state
//!
//! A [`Session`] owns everything one user has staged, indexed and asked. The
//! pipeline receives it explicitly for every action.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RagSettings;
use crate::retrieval::VectorIndex;
use crate::types::document::is_pdf_filename;
use crate::types::{
    ChatTurn, Document, FileReport, SessionSummary, UploadReport, UploadSkip, UploadSummary,
    UploadedFile,
};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing staged
    Empty,
    /// Files staged that are not yet reflected in the index
    DocumentsUploaded,
    /// Index built
    Indexed,
    /// Index built and the answer generator prepared
    Ready,
}

/// State of one user's session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    phase: SessionPhase,
    /// Files staged for the next Process, in upload order
    uploads: Vec<UploadedFile>,
    /// Documents behind the active index
    documents: Vec<Document>,
    /// Per-file reports from the last successful Process
    files: Vec<FileReport>,
    /// Active index; replaced wholesale on rebuild
    index: Option<Arc<VectorIndex>>,
    /// Settings of the active index, or the defaults before the first build
    settings: RagSettings,
    history: Vec<ChatTurn>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Create an empty session with default settings
    pub fn new(settings: RagSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Empty,
            uploads: Vec::new(),
            documents: Vec::new(),
            files: Vec::new(),
            index: None,
            settings,
            history: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Staged uploads in upload order
    pub fn uploads(&self) -> &[UploadedFile] {
        &self.uploads
    }

    /// Documents behind the active index
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Active index, if one was built
    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.index.as_ref()
    }

    /// Current settings
    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Questions can be asked whenever an index exists
    pub fn chat_enabled(&self) -> bool {
        self.index.is_some()
    }

    /// Chat history, oldest first
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Stage uploaded files for the next Process.
    ///
    /// Non-PDF and empty files are refused. A file identical to a staged one
    /// is skipped; a new version of a staged filename replaces it.
    pub fn upload(&mut self, files: Vec<UploadedFile>) -> UploadReport {
        let mut accepted = Vec::new();
        let mut replaced = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            if !is_pdf_filename(&file.filename) {
                skipped.push(UploadSkip {
                    filename: file.filename,
                    reason: "only PDF files are supported".to_string(),
                });
                continue;
            }
            if file.data.is_empty() {
                skipped.push(UploadSkip {
                    filename: file.filename,
                    reason: "file is empty".to_string(),
                });
                continue;
            }
            if let Some(existing) = self.uploads.iter().find(|u| u.content_hash == file.content_hash) {
                skipped.push(UploadSkip {
                    reason: format!("identical to already uploaded '{}'", existing.filename),
                    filename: file.filename,
                });
                continue;
            }

            match self.uploads.iter_mut().find(|u| u.filename == file.filename) {
                Some(slot) => {
                    replaced.push(file.filename.clone());
                    *slot = file;
                }
                None => {
                    accepted.push(file.filename.clone());
                    self.uploads.push(file);
                }
            }
        }

        if !accepted.is_empty() || !replaced.is_empty() {
            self.phase = SessionPhase::DocumentsUploaded;
        }

        tracing::info!(
            "Session {}: {} accepted, {} replaced, {} skipped, {} staged",
            self.id,
            accepted.len(),
            replaced.len(),
            skipped.len(),
            self.uploads.len()
        );

        UploadReport {
            accepted,
            replaced,
            skipped,
            staged: self.uploads.iter().map(|u| u.filename.clone()).collect(),
        }
    }

    /// Install a freshly built index, discarding the previous one
    pub fn commit_index(
        &mut self,
        index: VectorIndex,
        documents: Vec<Document>,
        files: Vec<FileReport>,
        settings: RagSettings,
    ) {
        self.index = Some(Arc::new(index));
        self.documents = documents;
        self.files = files;
        self.settings = settings;
        self.phase = SessionPhase::Indexed;
    }

    /// Mark the answer generator as prepared for the active index
    pub fn mark_ready(&mut self) {
        if self.index.is_some() {
            self.phase = SessionPhase::Ready;
        }
    }

    /// Append a completed exchange
    pub fn record_turn(&mut self, turn: ChatTurn) {
        self.history.push(turn);
    }

    /// Drop uploads, documents, index and history
    pub fn reset(&mut self, settings: RagSettings) {
        tracing::info!("Session {} reset", self.id);
        self.uploads.clear();
        self.documents.clear();
        self.files.clear();
        self.index = None;
        self.history.clear();
        self.settings = settings;
        self.phase = SessionPhase::Empty;
    }

    /// Snapshot for display
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            phase: self.phase,
            chat_enabled: self.chat_enabled(),
            uploads: self
                .uploads
                .iter()
                .map(|u| UploadSummary {
                    filename: u.filename.clone(),
                    size: u.size(),
                    uploaded_at: u.uploaded_at,
                })
                .collect(),
            files: self.files.clone(),
            index: self.index.as_ref().map(|i| i.info()),
            settings: self.settings.clone(),
            history_len: self.history.len(),
            created_at: self.created_at,
        }
    }
}
