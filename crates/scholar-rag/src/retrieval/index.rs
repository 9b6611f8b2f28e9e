//! In-memory vector index over embedded chunks

use crate::error::{Error, Result};
use crate::types::{Chunk, IndexInfo};

/// Name reported for this index implementation
pub const VECTORSTORE_TYPE: &str = "in-memory-cosine";

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query
    pub similarity: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Immutable index of chunks embedded with a single model.
///
/// Built all at once from fully embedded chunks; a session swaps the whole
/// index on rebuild rather than mutating it.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Chunks in ingestion order
    chunks: Vec<Chunk>,
    /// Model every vector was produced with
    embedding_model: String,
    /// Vector dimension
    dimensions: usize,
    /// Build timestamp
    built_at: chrono::DateTime<chrono::Utc>,
}

impl VectorIndex {
    /// Build an index; every chunk must carry an embedding of the same dimension
    pub fn build(chunks: Vec<Chunk>, embedding_model: impl Into<String>) -> Result<Self> {
        let first = chunks
            .first()
            .ok_or_else(|| Error::VectorIndex("cannot build an index without chunks".to_string()))?;
        let dimensions = first.embedding.len();
        if dimensions == 0 {
            return Err(Error::VectorIndex(format!("chunk {} has no embedding", first.id)));
        }

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(Error::VectorIndex(format!(
                "chunk {} has {} dimensions, expected {}",
                bad.id,
                bad.embedding.len(),
                dimensions
            )));
        }

        Ok(Self {
            chunks,
            embedding_model: embedding_model.into(),
            dimensions,
            built_at: chrono::Utc::now(),
        })
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks (never true for a built index)
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Indexed chunks in ingestion order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Model the index was built with
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Vector dimension
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Description for display
    pub fn info(&self) -> IndexInfo {
        IndexInfo {
            num_chunks: self.chunks.len(),
            vectorstore_type: VECTORSTORE_TYPE.to_string(),
            embedding_model: self.embedding_model.clone(),
            dimensions: self.dimensions,
            built_at: self.built_at,
        }
    }

    /// Return the `top_k` most similar chunks, highest first.
    ///
    /// Equal scores keep ingestion order. The query must come from the
    /// model the index was built with.
    pub fn search(&self, query_embedding: &[f32], query_model: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if query_model != self.embedding_model {
            return Err(Error::EmbeddingModelMismatch {
                index_model: self.embedding_model.clone(),
                query_model: query_model.to_string(),
            });
        }
        if query_embedding.len() != self.dimensions {
            return Err(Error::VectorIndex(format!(
                "query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&chunk.embedding, query_embedding)))
            .collect();

        // Stable sort keeps ingestion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                similarity,
            })
            .collect())
    }
}
