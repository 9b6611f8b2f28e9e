//! Response types for processing runs, questions and session views

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document};
use crate::config::RagSettings;
use crate::generation::citation::{highlight_snippet, truncate_snippet};

/// Citation of a retrieved chunk shown under an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Page number
    pub page_number: u32,
    /// Position in the retrieval ranking (1-based)
    pub rank: usize,
    /// Snippet from the source, truncated for display
    pub snippet: String,
    /// Snippet with highlighted query terms (<mark> tags)
    pub snippet_highlighted: String,
    /// Cosine similarity to the question
    pub similarity_score: f32,
}

impl Citation {
    /// Create a citation from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32, rank: usize, snippet_length: usize) -> Self {
        let snippet = truncate_snippet(&chunk.content, snippet_length);
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            filename: chunk.source.filename.clone(),
            page_number: chunk.source.page_number,
            rank,
            snippet_highlighted: snippet.clone(),
            snippet,
            similarity_score,
        }
    }

    /// Highlight query terms in the snippet
    pub fn highlight_terms(&mut self, terms: &[&str]) {
        self.snippet_highlighted = highlight_snippet(&self.snippet, terms);
    }
}

/// One question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Turn ID
    pub id: Uuid,
    /// Question as asked
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Chunks passed to the model for this answer
    pub sources: Vec<Citation>,
    /// Completion model that produced the answer
    pub llm_model: String,
    /// Wall-clock time spent on the question
    pub processing_time_ms: u64,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of extracting one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Text extracted and indexed
    Indexed,
    /// No extractable text; excluded from the index
    Empty,
    /// Unreadable or corrupt; skipped
    Failed,
}

/// Per-file details reported after processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    /// Filename
    pub filename: String,
    /// Extraction outcome
    pub status: FileStatus,
    /// Number of pages (0 if unreadable)
    pub total_pages: u32,
    /// Characters of extracted text
    pub total_text_length: usize,
    /// Chunks created from this file
    pub chunks: u32,
    /// Warning or error shown to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Report for a successfully extracted document
    pub fn indexed(doc: &Document) -> Self {
        Self {
            filename: doc.filename.clone(),
            status: FileStatus::Indexed,
            total_pages: doc.total_pages(),
            total_text_length: doc.total_text_length(),
            chunks: doc.total_chunks,
            error: None,
        }
    }

    /// Report for a document without text
    pub fn empty(filename: impl Into<String>, total_pages: u32) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Empty,
            total_pages,
            total_text_length: 0,
            chunks: 0,
            error: Some(
                "No text could be extracted (the PDF may contain only scanned images)".to_string(),
            ),
        }
    }

    /// Report for a file that could not be read
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Failed,
            total_pages: 0,
            total_text_length: 0,
            chunks: 0,
            error: Some(error.into()),
        }
    }
}

/// Description of the active vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Number of chunks in the index
    pub num_chunks: usize,
    /// Index implementation
    pub vectorstore_type: String,
    /// Embedding model the index was built with
    pub embedding_model: String,
    /// Vector dimension
    pub dimensions: usize,
    /// Build timestamp
    pub built_at: chrono::DateTime<chrono::Utc>,
}

/// Result of a successful Process action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReport {
    /// Per-file extraction details
    pub files: Vec<FileReport>,
    /// The index now active for the session
    pub index: IndexInfo,
    /// Settings the index was built with
    pub settings: RagSettings,
    /// Warnings for skipped or empty files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// A file refused at upload time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSkip {
    /// Filename
    pub filename: String,
    /// Why it was not staged
    pub reason: String,
}

/// Result of an upload action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    /// Newly staged filenames
    pub accepted: Vec<String>,
    /// Staged files replaced by a new version with the same name
    pub replaced: Vec<String>,
    /// Files not staged
    pub skipped: Vec<UploadSkip>,
    /// All files now staged for the next Process
    pub staged: Vec<String>,
}

/// Staged upload as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Filename
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Snapshot of a session for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID
    pub id: Uuid,
    /// Current phase
    pub phase: crate::session::SessionPhase,
    /// Whether questions can be asked
    pub chat_enabled: bool,
    /// Files staged for processing
    pub uploads: Vec<UploadSummary>,
    /// Details from the last successful Process
    pub files: Vec<FileReport>,
    /// Active index, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexInfo>,
    /// Settings of the active index, or the session defaults
    pub settings: RagSettings,
    /// Number of chat turns
    pub history_len: usize,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::ChunkSource;

    fn chunk(content: &str) -> Chunk {
        Chunk::new(
            Uuid::new_v4(),
            content.to_string(),
            ChunkSource::pdf("paper.pdf".to_string(), 2, 3),
            0,
        )
    }

    #[test]
    fn test_citation_from_chunk() {
        let c = chunk("Transformers rely on attention.");
        let citation = Citation::from_chunk(&c, 0.82, 1, 200);
        assert_eq!(citation.chunk_id, c.id);
        assert_eq!(citation.page_number, 2);
        assert_eq!(citation.snippet, "Transformers rely on attention.");
    }

    #[test]
    fn test_citation_snippet_truncated() {
        let long = "x".repeat(250);
        let citation = Citation::from_chunk(&chunk(&long), 0.5, 1, 200);
        assert_eq!(citation.snippet.chars().count(), 203);
        assert!(citation.snippet.ends_with("..."));
    }

    #[test]
    fn test_file_report_serialization() {
        let report = FileReport::empty("scan.pdf", 4);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "empty");
        assert_eq!(json["total_pages"], 4);
        assert!(json["error"].as_str().unwrap().contains("No text"));
    }
}
