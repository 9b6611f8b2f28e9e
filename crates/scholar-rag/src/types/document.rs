//! Document, page and chunk types with source tracking for citations

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex SHA-256 of a byte payload, used for upload deduplication
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Whether a filename carries the `.pdf` extension (case-insensitive)
pub fn is_pdf_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// A file staged in a session but not yet processed
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as uploaded by the user
    pub filename: String,
    /// Raw bytes
    pub data: Bytes,
    /// SHA-256 of `data`
    pub content_hash: String,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl UploadedFile {
    /// Wrap an upload and hash its content
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            filename: filename.into(),
            content_hash: hash_bytes(&data),
            data,
            uploaded_at: chrono::Utc::now(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A single extracted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Cleaned text of the page (may be empty)
    pub text: String,
}

impl Page {
    /// Create a page record
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the page yielded any text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A PDF whose text has been extracted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded by user
    pub filename: String,
    /// Content hash of the uploaded bytes
    pub content_hash: String,
    /// All pages in order, including pages without text
    pub pages: Vec<Page>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Extraction timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document from extracted pages
    pub fn new(filename: String, content_hash: String, file_size: u64, pages: Vec<Page>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            content_hash,
            pages,
            total_chunks: 0,
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Number of pages in the PDF
    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Characters of extracted text across all pages
    pub fn total_text_length(&self) -> usize {
        self.pages.iter().map(Page::char_len).sum()
    }

    /// Whether any page yielded text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(Page::has_text)
    }

    /// Look up a page by number
    pub fn page(&self, page_number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Original filename as uploaded (used in citations)
    pub filename: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in document
    pub page_count: u32,
}

impl ChunkSource {
    /// Create source info for a PDF page
    pub fn pdf(filename: String, page: u32, total_pages: u32) -> Self {
        Self {
            filename,
            page_number: page,
            page_count: total_pages,
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.filename, self.page_number)
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Embedding vector, filled in when indexed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information for citations
    pub source: ChunkSource,
    /// Chunk index within document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(document_id: Uuid, content: String, source: ChunkSource, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            source,
            chunk_index,
        }
    }
}
