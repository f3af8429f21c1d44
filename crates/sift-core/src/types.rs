//! Core domain types for the retrieval engine.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::embedding::normalize_embedding;
use crate::error::Result;

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single conversation turn, oldest-first in history slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// User-provided metadata attached to a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Topical category (e.g. "leave_vacation").
    #[serde(default)]
    pub category: Option<String>,

    /// Originating document or feed.
    #[serde(default)]
    pub source: Option<String>,

    /// Content kind (e.g. "policy", "procedure", "qa_pair").
    #[serde(default)]
    pub kind: Option<String>,
}

impl ChunkMetadata {
    /// Whether the metadata carries an authoritative document kind.
    pub fn is_authoritative(&self) -> bool {
        matches!(self.kind.as_deref(), Some("policy") | Some("procedure"))
    }
}

/// A bounded content fragment, the unit of retrieval.
///
/// Chunks are produced by ingestion (out of scope here) and are immutable
/// within a query. Embedding dimensionality is constant corpus-wide and is
/// validated at the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (ULID string when generated locally).
    pub id: String,

    /// Chunk text content.
    pub content: String,

    /// Typed embedding vector; empty when unavailable.
    #[serde(default)]
    pub embedding: Vec<f32>,

    /// Attached metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,

    /// Creation timestamp (Unix millis).
    #[serde(default)]
    pub created_at: u64,

    /// Blake3 hash of the content, used for duplicate detection.
    #[serde(with = "serde_bytes_opt", default)]
    pub content_hash: Option<[u8; 32]>,
}

impl Chunk {
    /// Create a new chunk with a fresh ULID and content hash.
    pub fn new(content: &str, metadata: ChunkMetadata) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let content_hash = blake3::hash(content.as_bytes());

        Self {
            id: Ulid::new().to_string(),
            content: content.to_string(),
            embedding: Vec::new(),
            metadata,
            created_at: now,
            content_hash: Some(*content_hash.as_bytes()),
        }
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Build a chunk from a loosely-typed storage record.
    ///
    /// Accepts the shapes the storage layer is known to produce: `content`
    /// as a string, `embedding` as a raw array / encoded string / wrapper
    /// object, optional `metadata` and `created_at`/`createdAt` fields.
    /// An irreducible embedding degrades to an empty vector (scoring
    /// neutral-low) instead of failing the record.
    pub fn from_value(value: &serde_json::Value, expected_dim: Option<usize>) -> Result<Self> {
        let content = value
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| crate::error::SiftError::invalid_argument("record has no content"))?;

        let metadata = value
            .get("metadata")
            .map(|m| serde_json::from_value(m.clone()).unwrap_or_default())
            .unwrap_or_default();

        let mut chunk = Chunk::new(content, metadata);

        if let Some(id) = value.get("id").or_else(|| value.get("_id")) {
            if let Some(id) = id.as_str() {
                chunk.id = id.to_string();
            }
        }

        if let Some(ts) = value
            .get("created_at")
            .or_else(|| value.get("createdAt"))
            .and_then(|t| t.as_u64())
        {
            chunk.created_at = ts;
        }

        if let Some(raw) = value.get("embedding") {
            chunk.embedding = normalize_embedding(raw, expected_dim).unwrap_or_default();
        }

        Ok(chunk)
    }

    /// Stable key for merge maps: the id, or a content prefix when ids are
    /// missing from the storage layer.
    pub fn key(&self) -> String {
        if self.id.is_empty() {
            self.content.chars().take(50).collect()
        } else {
            self.id.clone()
        }
    }
}

/// A chunk together with the transient per-query scores.
///
/// All score fields are recomputed on every query and never written back
/// to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// BM25 score from the lexical pass.
    #[serde(default)]
    pub lexical_score: f32,

    /// Weighted multi-metric similarity from the vector pass.
    #[serde(default)]
    pub vector_score: f32,

    /// Score after hybrid fusion.
    #[serde(default)]
    pub fused_score: f32,

    /// Score after the precision re-ranking passes.
    #[serde(default)]
    pub precision_score: f32,

    /// Penalty subtracted by the anti-repetition engine.
    #[serde(default)]
    pub anti_repetition_penalty: f32,

    /// Produced by the vector retriever.
    #[serde(default)]
    pub from_vector: bool,

    /// Produced by the keyword retriever.
    #[serde(default)]
    pub from_keyword: bool,
}

impl ScoredChunk {
    /// Wrap a chunk scored by the lexical pass.
    pub fn lexical(chunk: Chunk, score: f32) -> Self {
        Self {
            chunk,
            lexical_score: score,
            vector_score: 0.0,
            fused_score: 0.0,
            precision_score: 0.0,
            anti_repetition_penalty: 0.0,
            from_vector: false,
            from_keyword: true,
        }
    }

    /// Wrap a chunk scored by the vector pass.
    pub fn vector(chunk: Chunk, score: f32) -> Self {
        Self {
            chunk,
            lexical_score: 0.0,
            vector_score: score,
            fused_score: 0.0,
            precision_score: 0.0,
            anti_repetition_penalty: 0.0,
            from_vector: true,
            from_keyword: false,
        }
    }

    /// Merge key, delegating to the chunk.
    pub fn key(&self) -> String {
        self.chunk.key()
    }
}

/// Sort a slice of scored chunks by a score accessor, descending.
pub fn sort_descending_by<F>(chunks: &mut [ScoredChunk], score: F)
where
    F: Fn(&ScoredChunk) -> f32,
{
    chunks.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Repetition risk level for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Retrieval strategy selected from the repetition risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Normal,
    ModerateDiversification,
    AggressiveDiversification,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::ModerateDiversification => "moderate_diversification",
            Self::AggressiveDiversification => "aggressive_diversification",
        };
        write!(f, "{}", s)
    }
}

/// The narrow output of the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// The original question.
    pub question: String,

    /// Token-budgeted context string for the generator; empty on fallback.
    pub context_string: String,

    /// Final ranked selection, at most `final_top_k` chunks.
    pub selected_chunks: Vec<ScoredChunk>,

    /// Strategy chosen by the anti-repetition engine.
    pub strategy: Strategy,

    /// True when no relevant chunk survived the pipeline (or when both
    /// upstream collaborators were unavailable).
    pub fallback: bool,
}

impl RetrievedContext {
    /// The well-defined empty result for the "no relevant documents" case.
    pub fn fallback(question: &str, strategy: Strategy) -> Self {
        Self {
            question: question.to_string(),
            context_string: String::new(),
            selected_chunks: Vec::new(),
            strategy,
            fallback: true,
        }
    }
}

/// Helper module for optional byte array serialization.
mod serde_bytes_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => {
                let hex = hex::encode(bytes);
                hex.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(hex) => {
                let bytes = hex::decode(&hex).map_err(serde::de::Error::custom)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("invalid hash length"))?;
                Ok(Some(arr))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_new_assigns_id_and_hash() {
        let chunk = Chunk::new("Yıllık izin 14 gündür.", ChunkMetadata::default());
        assert!(!chunk.id.is_empty());
        assert!(chunk.content_hash.is_some());
        assert!(chunk.created_at > 0);
    }

    #[test]
    fn test_chunk_key_falls_back_to_content_prefix() {
        let mut chunk = Chunk::new("some content for the fallback key", ChunkMetadata::default());
        chunk.id = String::new();
        assert!(chunk.key().starts_with("some content"));
    }

    #[test]
    fn test_chunk_from_value_accepts_wrapper_embedding() {
        let value = json!({
            "content": "Maaş ayın 5'inde ödenir.",
            "embedding": { "values": [0.1, 0.2, 0.3] },
            "metadata": { "category": "pay" },
            "createdAt": 1700000000000u64
        });

        let chunk = Chunk::from_value(&value, Some(3)).unwrap();
        assert_eq!(chunk.embedding.len(), 3);
        assert_eq!(chunk.metadata.category.as_deref(), Some("pay"));
        assert_eq!(chunk.created_at, 1700000000000);
    }

    #[test]
    fn test_chunk_from_value_degrades_bad_embedding() {
        let value = json!({
            "content": "content with an unusable embedding",
            "embedding": "not a vector at all"
        });

        let chunk = Chunk::from_value(&value, Some(3)).unwrap();
        assert!(chunk.embedding.is_empty());
    }

    #[test]
    fn test_metadata_authoritative() {
        let meta = ChunkMetadata {
            kind: Some("policy".to_string()),
            ..Default::default()
        };
        assert!(meta.is_authoritative());
        assert!(!ChunkMetadata::default().is_authoritative());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(
            Strategy::AggressiveDiversification.to_string(),
            "aggressive_diversification"
        );
    }
}
