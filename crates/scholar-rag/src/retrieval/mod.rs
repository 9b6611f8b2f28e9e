//! Vector retrieval

mod index;

pub use index::{cosine_similarity, ScoredChunk, VectorIndex, VECTORSTORE_TYPE};
