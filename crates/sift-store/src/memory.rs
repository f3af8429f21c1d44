//! In-memory store implementation.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use sift_core::{Chunk, ChunkStore, Result, SiftError};

/// Minimum normalized length for a chunk to be worth storing.
const MIN_CONTENT_LEN: usize = 20;

/// Normalized-content prefix length used as the duplicate key.
const DEDUP_PREFIX: usize = 100;

/// In-memory chunk store.
///
/// Suitable for small corpora (thousands of chunks); all scoring runs
/// in-process over `fetch_all`, so no native vector search is advertised.
pub struct MemoryStore {
    chunks: Mutex<Vec<Chunk>>,
    seen: Mutex<HashSet<[u8; 32]>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Insert chunks, dropping near-duplicate and degenerate content.
    ///
    /// Returns the number actually stored.
    pub fn insert(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let mut stored = self
            .chunks
            .lock()
            .map_err(|e| SiftError::store(e.to_string()))?;
        let mut seen = self
            .seen
            .lock()
            .map_err(|e| SiftError::store(e.to_string()))?;

        let before = stored.len();
        for chunk in chunks {
            let key = match dedup_key(&chunk.content) {
                Some(key) => key,
                None => continue, // too short to store
            };

            if seen.insert(key) {
                stored.push(chunk);
            }
        }

        let inserted = stored.len() - before;
        debug!(inserted, total = stored.len(), "chunks inserted");
        Ok(inserted)
    }

    /// Insert loosely-typed storage records (see `Chunk::from_value`).
    ///
    /// Records without content are skipped; malformed embeddings degrade
    /// per record, never failing the batch.
    pub fn insert_values(
        &self,
        values: &[serde_json::Value],
        expected_dim: Option<usize>,
    ) -> Result<usize> {
        let chunks: Vec<Chunk> = values
            .iter()
            .filter_map(|value| Chunk::from_value(value, expected_dim).ok())
            .collect();
        self.insert(chunks)
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.clear();
        }
        if let Ok(mut seen) = self.seen.lock() {
            seen.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Chunk>> {
        let chunks = self
            .chunks
            .lock()
            .map_err(|e| SiftError::store(e.to_string()))?;
        Ok(chunks.clone())
    }
}

/// Blake3 hash of the normalized content prefix, or None for content too
/// short to store.
fn dedup_key(content: &str) -> Option<[u8; 32]> {
    let normalized: String = content
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.chars().count() < MIN_CONTENT_LEN {
        return None;
    }

    let prefix: String = normalized.chars().take(DEDUP_PREFIX).collect();
    Some(*blake3::hash(prefix.as_bytes()).as_bytes())
}
