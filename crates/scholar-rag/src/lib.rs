//! scholar-rag: chat with PDF papers through retrieval-augmented generation
//!
//! Uploaded PDFs are extracted page by page, split into overlapping chunks,
//! embedded into an in-memory cosine index and queried to ground answers from
//! an OpenAI-compatible chat model. Every answer carries the filename and page
//! of the chunks it was generated from.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::{resolve_api_key, ApiKey, RagConfig, RagSettings};
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use session::{Session, SessionPhase};
pub use types::{
    document::{Chunk, ChunkSource, Document, Page},
    query::{AskRequest, ProcessRequest},
    response::{ChatTurn, Citation, ProcessReport},
};
