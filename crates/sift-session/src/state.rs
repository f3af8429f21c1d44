//! Session memory: bounded turn ring and TTL-pruned term usage counters.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sift_core::{ScoredChunk, SessionConfig, Strategy};
use sift_expand::{extract_keywords, Lexicon};

/// One remembered completed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub question: String,
    pub answer: String,
    pub used_chunk_ids: Vec<String>,
    pub used_categories: Vec<String>,
    pub timestamp_ms: u64,
    pub strategy: Strategy,
}

/// Rolling usage of one keyword across recent selections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TermUsage {
    pub count: u32,
    pub last_used_ms: u64,
}

/// Per-session anti-repetition state.
///
/// Shared mutable across sequential requests of one session; hosts that
/// allow concurrent in-flight queries must serialize access (the pipeline
/// wraps it in a mutex). Read during scoring, written exactly once at
/// query completion.
pub struct SessionState {
    pub(crate) config: SessionConfig,
    pub(crate) lexicon: Arc<Lexicon>,
    pub(crate) memory: VecDeque<MemoryEntry>,
    pub(crate) term_usage: HashMap<String, TermUsage>,
    pub(crate) diversify_suffix: String,
}

impl SessionState {
    pub fn new(config: SessionConfig, lexicon: Arc<Lexicon>, diversify_suffix: String) -> Self {
        Self {
            config,
            lexicon,
            memory: VecDeque::new(),
            term_usage: HashMap::new(),
            diversify_suffix,
        }
    }

    /// Remembered turns, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.memory.iter()
    }

    /// Tracked keyword count (after the last purge).
    pub fn tracked_terms(&self) -> usize {
        self.term_usage.len()
    }

    /// The single end-of-query memory update.
    ///
    /// Pushes a ring entry (evicting past capacity), bumps usage counters
    /// for every keyword of every used chunk, and purges counters past
    /// their TTL. Call exactly once per completed query.
    pub fn record_turn(
        &mut self,
        question: &str,
        answer: &str,
        used: &[ScoredChunk],
        strategy: Strategy,
    ) {
        self.record_turn_at(question, answer, used, strategy, now_ms());
    }

    /// `record_turn` with an injected clock, for deterministic tests.
    pub fn record_turn_at(
        &mut self,
        question: &str,
        answer: &str,
        used: &[ScoredChunk],
        strategy: Strategy,
        now_ms: u64,
    ) {
        let mut used_categories: Vec<String> = Vec::new();
        for chunk in used {
            if let Some(category) = &chunk.chunk.metadata.category {
                if !used_categories.contains(category) {
                    used_categories.push(category.clone());
                }
            }
        }

        self.memory.push_back(MemoryEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            used_chunk_ids: used.iter().map(|c| c.chunk.key()).collect(),
            used_categories,
            timestamp_ms: now_ms,
            strategy,
        });
        while self.memory.len() > self.config.memory_size {
            self.memory.pop_front();
        }

        for chunk in used {
            for keyword in extract_keywords(&chunk.chunk.content, &self.lexicon) {
                let usage = self.term_usage.entry(keyword).or_insert(TermUsage {
                    count: 0,
                    last_used_ms: now_ms,
                });
                usage.count += 1;
                usage.last_used_ms = now_ms;
            }
        }

        let ttl_ms = self.config.usage_ttl_secs * 1000;
        self.term_usage
            .retain(|_, usage| now_ms.saturating_sub(usage.last_used_ms) <= ttl_ms);

        debug!(
            memory = self.memory.len(),
            tracked_terms = self.term_usage.len(),
            "session memory updated"
        );
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{Chunk, ChunkMetadata};

    fn state() -> SessionState {
        SessionState::new(
            SessionConfig::default(),
            Arc::new(Lexicon::default()),
            String::new(),
        )
    }

    fn used_chunk(content: &str, category: Option<&str>) -> ScoredChunk {
        let chunk = Chunk::new(
            content,
            ChunkMetadata {
                category: category.map(String::from),
                ..Default::default()
            },
        );
        ScoredChunk::lexical(chunk, 1.0)
    }

    #[test]
    fn test_memory_ring_bounded() {
        let mut state = state();
        for i in 0..12 {
            state.record_turn(
                &format!("soru {}", i),
                &format!("cevap {}", i),
                &[],
                Strategy::Normal,
            );
        }

        assert_eq!(state.memory.len(), state.config.memory_size);
        // Oldest entries evicted first.
        assert_eq!(state.memory.front().unwrap().question, "soru 7");
        assert_eq!(state.memory.back().unwrap().question, "soru 11");
    }

    #[test]
    fn test_usage_counters_accumulate() {
        let mut state = state();
        let chunk = used_chunk("izin başvurusu yazılı yapılır", Some("leave"));

        state.record_turn("soru", "cevap", &[chunk.clone()], Strategy::Normal);
        state.record_turn("soru", "cevap", &[chunk], Strategy::Normal);

        let usage = state.term_usage.get("izin").unwrap();
        assert_eq!(usage.count, 2);
    }

    #[test]
    fn test_usage_ttl_purge() {
        let mut state = state();
        let chunk = used_chunk("izin başvurusu yazılı yapılır", None);

        let start = 1_000_000_000_000;
        state.record_turn_at("soru", "cevap", &[chunk], Strategy::Normal, start);
        assert!(state.tracked_terms() > 0);

        // Recording far in the future purges the stale counters.
        let later = start + (state.config.usage_ttl_secs + 10) * 1000;
        state.record_turn_at("yeni soru", "yeni cevap", &[], Strategy::Normal, later);
        assert_eq!(state.tracked_terms(), 0);
    }

    #[test]
    fn test_used_categories_deduplicated() {
        let mut state = state();
        let chunks = vec![
            used_chunk("birinci içerik parçası", Some("leave")),
            used_chunk("ikinci içerik parçası", Some("leave")),
            used_chunk("üçüncü içerik parçası", Some("pay")),
        ];

        state.record_turn("soru", "cevap", &chunks, Strategy::Normal);
        let entry = state.memory.back().unwrap();
        assert_eq!(entry.used_categories, vec!["leave", "pay"]);
        assert_eq!(entry.used_chunk_ids.len(), 3);
    }
}
