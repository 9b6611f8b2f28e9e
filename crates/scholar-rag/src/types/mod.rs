//! Core types for the RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, Page, UploadedFile};
pub use query::{AskRequest, ProcessRequest};
pub use response::{
    ChatTurn, Citation, FileReport, FileStatus, IndexInfo, ProcessReport, SessionSummary,
    UploadReport, UploadSkip, UploadSummary,
};
