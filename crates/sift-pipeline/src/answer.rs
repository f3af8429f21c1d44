//! Answer envelope returned by the application-edge `answer` call.

use sift_core::{ScoredChunk, Strategy};

/// Characters of chunk content exposed in a source reference.
const PREVIEW_CHARS: usize = 200;

/// A citation-style reference to one selected chunk.
#[derive(Debug, Clone)]
pub struct SourceRef {
    pub preview: String,
    pub category: Option<String>,
    pub source: Option<String>,
    pub score: f32,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(candidate: &ScoredChunk) -> Self {
        let mut preview: String = candidate.chunk.content.chars().take(PREVIEW_CHARS).collect();
        if candidate.chunk.content.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }

        Self {
            preview,
            category: candidate.chunk.metadata.category.clone(),
            source: candidate.chunk.metadata.source.clone(),
            score: candidate.precision_score,
        }
    }
}

/// Bookkeeping around a generated answer.
#[derive(Debug, Clone)]
pub struct AnswerMetadata {
    pub retrieved_documents: usize,
    pub total_tokens: usize,
    pub response_time_ms: u64,
    pub strategy: Strategy,
    pub fallback: bool,
    pub error: Option<String>,
}

/// The complete answer envelope.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub metadata: AnswerMetadata,
}

impl Answer {
    /// The static apology used when retrieval found nothing or an
    /// upstream collaborator failed.
    pub(crate) fn fallback(
        question: &str,
        message: &str,
        strategy: Strategy,
        response_time_ms: u64,
        error: Option<String>,
    ) -> Self {
        Self {
            question: question.to_string(),
            answer: message.to_string(),
            sources: Vec::new(),
            metadata: AnswerMetadata {
                retrieved_documents: 0,
                total_tokens: 0,
                response_time_ms,
                strategy,
                fallback: true,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{Chunk, ChunkMetadata};

    #[test]
    fn test_source_ref_preview_truncated() {
        let long = "kelime ".repeat(100);
        let chunk = Chunk::new(&long, ChunkMetadata::default());
        let mut scored = ScoredChunk::lexical(chunk, 1.0);
        scored.precision_score = 2.5;

        let source = SourceRef::from(&scored);
        assert!(source.preview.ends_with("..."));
        assert!(source.preview.chars().count() <= PREVIEW_CHARS + 3);
        assert!((source.score - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fallback_shape() {
        let answer = Answer::fallback("soru", "bilgi yok", Strategy::Normal, 5, None);
        assert!(answer.metadata.fallback);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.answer, "bilgi yok");
    }
}
