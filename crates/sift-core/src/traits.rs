//! Core traits defining the interfaces to the external collaborators.
//!
//! Persistence, embedding inference and answer generation are out of
//! scope for this workspace; they appear only as these narrow async
//! boundaries.

use async_trait::async_trait;

use crate::error::{Result, SiftError};
use crate::types::{ChatMessage, Chunk, ScoredChunk};

/// Chunk persistence boundary.
///
/// The engine only requires `fetch_all`; stores with native vector search
/// can advertise it to skip the in-process similarity pass.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch every chunk in the corpus.
    async fn fetch_all(&self) -> Result<Vec<Chunk>>;

    /// Whether `vector_search` is natively supported.
    fn supports_vector_search(&self) -> bool {
        false
    }

    /// Native vector similarity search, highest score first.
    async fn vector_search(&self, _embedding: &[f32], _k: usize) -> Result<Vec<ScoredChunk>> {
        Err(SiftError::store("native vector search not supported"))
    }
}

/// Embedding model boundary. Dimensionality is stable across calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Text generation boundary, invoked only after retrieval returns its
/// ranked context.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer from a directive, the assembled context, the
    /// question and the conversation history.
    async fn generate(
        &self,
        directive: &str,
        context: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String>;
}
