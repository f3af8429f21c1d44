//! Repetition risk analysis and score adjustment.

use std::collections::HashSet;

use tracing::debug;

use sift_core::{ChatMessage, RiskLevel, Role, ScoredChunk, Strategy};
use sift_expand::{extract_keywords, keyword_jaccard};

use crate::state::SessionState;

/// User turns compared against the current question.
const RECENT_QUESTIONS: usize = 3;

/// Stored answers compared against the current question.
const RECENT_ANSWERS: usize = 3;

/// History window for topic stagnation.
const STAGNATION_WINDOW: usize = 6;

/// Per-use reuse pressure per tracked keyword.
const REUSE_PRESSURE: f32 = 0.1;

/// Memory entries consulted for the high-risk novelty bonus.
const NOVELTY_WINDOW: usize = 2;

/// The four signals behind a risk decision, each in [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskFactors {
    /// Max keyword overlap with recent user questions.
    pub question_similarity: f32,

    /// Mean keyword overlap with recent stored answers.
    pub answer_similarity: f32,

    /// Topic stagnation flag (0.8 stuck / 0.2 moving / 0 short history).
    pub topic_stagnation: f32,

    /// Chunk-reuse pressure from the usage counters, capped at 1.
    pub chunk_reuse: f32,
}

impl RiskFactors {
    fn average(&self) -> f32 {
        (self.question_similarity + self.answer_similarity + self.topic_stagnation
            + self.chunk_reuse)
            / 4.0
    }
}

/// The outcome of risk analysis for one question.
#[derive(Debug, Clone, Copy)]
pub struct RiskAnalysis {
    pub level: RiskLevel,
    pub strategy: Strategy,
    pub factors: RiskFactors,
}

impl RiskAnalysis {
    /// The no-risk analysis used when the engine is disabled.
    pub fn disabled() -> Self {
        Self {
            level: RiskLevel::Low,
            strategy: Strategy::Normal,
            factors: RiskFactors::default(),
        }
    }
}

impl SessionState {
    /// Analyze the repetition risk of a question.
    ///
    /// Averages four signals; the average is monotonic in the overlap
    /// with the most recent questions when the other signals are held
    /// fixed.
    pub fn analyze(&self, question: &str, history: &[ChatMessage]) -> RiskAnalysis {
        if !self.config.enabled {
            return RiskAnalysis::disabled();
        }

        let factors = RiskFactors {
            question_similarity: self.question_similarity(question, history),
            answer_similarity: self.answer_similarity(question),
            topic_stagnation: self.topic_stagnation(history),
            chunk_reuse: self.chunk_reuse(question),
        };

        let total = factors.average();
        let (level, strategy) = if total > self.config.high_risk {
            (RiskLevel::High, Strategy::AggressiveDiversification)
        } else if total > self.config.medium_risk {
            (RiskLevel::Medium, Strategy::ModerateDiversification)
        } else {
            (RiskLevel::Low, Strategy::Normal)
        };

        debug!(
            risk = ?level,
            question_similarity = factors.question_similarity,
            answer_similarity = factors.answer_similarity,
            topic_stagnation = factors.topic_stagnation,
            chunk_reuse = factors.chunk_reuse,
            "repetition risk analyzed"
        );

        RiskAnalysis {
            level,
            strategy,
            factors,
        }
    }

    /// Adjust candidate scores according to the analyzed risk.
    ///
    /// At medium and high risk every candidate pays a penalty
    /// proportional to how often its keywords were recently used; at high
    /// risk only, chunks from categories absent in the last two memory
    /// entries get a fixed novelty bonus. Low risk leaves the candidates
    /// untouched.
    pub fn apply_penalties(&self, candidates: &mut [ScoredChunk], analysis: &RiskAnalysis) {
        if !self.config.enabled || analysis.level == RiskLevel::Low {
            return;
        }

        for candidate in candidates.iter_mut() {
            let mut penalty = 0.0;
            for keyword in extract_keywords(&candidate.chunk.content, &self.lexicon) {
                if let Some(usage) = self.term_usage.get(&keyword) {
                    penalty += usage.count as f32 * self.config.diversity_enforcement;
                }
            }

            candidate.anti_repetition_penalty = penalty;
            candidate.precision_score -= penalty;
        }

        if analysis.level == RiskLevel::High {
            let recent_categories: HashSet<&String> = self
                .memory
                .iter()
                .rev()
                .take(NOVELTY_WINDOW)
                .flat_map(|entry| entry.used_categories.iter())
                .collect();

            for candidate in candidates.iter_mut() {
                if let Some(category) = &candidate.chunk.metadata.category {
                    if !recent_categories.contains(category) {
                        candidate.precision_score += self.config.novelty_bonus;
                    }
                }
            }
        }
    }

    /// Post-generation repetition check.
    ///
    /// When the new answer overlaps the immediately preceding stored
    /// answer beyond the threshold, the configured diversifying suffix is
    /// appended.
    pub fn finalize_answer(&self, answer: String) -> String {
        if !self.config.enabled {
            return answer;
        }

        if let Some(last) = self.memory.back() {
            let similarity = keyword_jaccard(&answer, &last.answer, &self.lexicon);
            if similarity > self.config.repetition_threshold {
                debug!(similarity, "high answer similarity, appending variation");
                return format!("{}{}", answer, self.diversify_suffix);
            }
        }

        answer
    }

    fn question_similarity(&self, question: &str, history: &[ChatMessage]) -> f32 {
        history
            .iter()
            .filter(|m| m.role == Role::User)
            .rev()
            .take(RECENT_QUESTIONS)
            .map(|m| keyword_jaccard(question, &m.content, &self.lexicon))
            .fold(0.0_f32, f32::max)
    }

    fn answer_similarity(&self, question: &str) -> f32 {
        let recent: Vec<&str> = self
            .memory
            .iter()
            .rev()
            .take(RECENT_ANSWERS)
            .map(|entry| entry.answer.as_str())
            .collect();

        if recent.is_empty() {
            return 0.0;
        }

        let total: f32 = recent
            .iter()
            .map(|answer| keyword_jaccard(question, answer, &self.lexicon))
            .sum();
        total / recent.len() as f32
    }

    fn topic_stagnation(&self, history: &[ChatMessage]) -> f32 {
        if history.len() < 4 {
            return 0.0;
        }

        let topics: HashSet<String> = history
            .iter()
            .rev()
            .take(STAGNATION_WINDOW)
            .filter(|m| m.role == Role::User)
            .map(|m| self.main_topic(&m.content))
            .collect();

        if topics.len() < 2 {
            0.8
        } else {
            0.2
        }
    }

    fn chunk_reuse(&self, question: &str) -> f32 {
        let mut pressure = 0.0;
        for keyword in extract_keywords(question, &self.lexicon) {
            if let Some(usage) = self.term_usage.get(&keyword) {
                pressure += usage.count as f32 * REUSE_PRESSURE;
            }
        }
        pressure.min(1.0)
    }

    /// First topic-marker keyword of the text, or its first keyword.
    fn main_topic(&self, text: &str) -> String {
        let keywords = extract_keywords(text, &self.lexicon);
        for keyword in &keywords {
            if self.lexicon.topics.contains(keyword) {
                return keyword.clone();
            }
        }
        keywords.into_iter().next().unwrap_or_else(|| "genel".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sift_core::{Chunk, ChunkMetadata, SessionConfig};
    use sift_expand::Lexicon;

    fn state() -> SessionState {
        SessionState::new(
            SessionConfig::default(),
            Arc::new(Lexicon::default()),
            "\n\n*ek*".to_string(),
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
    fn test_first_question_is_low_risk() {
        let analysis = state().analyze("izin kaç gün?", &[]);
        assert_eq!(analysis.level, RiskLevel::Low);
        assert_eq!(analysis.strategy, Strategy::Normal);
    }

    #[test]
    fn test_near_duplicate_question_raises_risk() {
        // Scenario: two near-duplicate consecutive questions in one
        // session climb from low to at least medium.
        let mut state = state();

        let first = state.analyze("yıllık izin kaç gündür?", &[]);
        assert_eq!(first.level, RiskLevel::Low);

        state.record_turn(
            "yıllık izin kaç gündür?",
            "Yıllık izin 14 gündür.",
            &[used_chunk("yıllık izin hakkında detaylı kurallar", Some("leave"))],
            first.strategy,
        );

        let history = vec![
            ChatMessage::user("yıllık izin kaç gündür?"),
            ChatMessage::assistant("Yıllık izin 14 gündür."),
        ];
        let second = state.analyze("yıllık izin kaç gündür?", &history);
        assert!(second.level >= RiskLevel::Medium);
    }

    #[test]
    fn test_risk_monotonic_in_question_overlap() {
        let state = state();
        let history = vec![ChatMessage::user("izin bordro mesai konuları")];

        let distant = state.analyze("seyahat harcırahı nedir", &history);
        let close = state.analyze("izin bordro mesai detayları", &history);
        assert!(
            close.factors.question_similarity > distant.factors.question_similarity
        );
    }

    #[test]
    fn test_penalties_only_at_elevated_risk() {
        let mut state = state();
        state.record_turn(
            "izin sorusu",
            "izin cevabı",
            &[used_chunk("izin kuralları burada", None)],
            Strategy::Normal,
        );

        let mut candidates = vec![used_chunk("izin kuralları burada", None)];
        candidates[0].precision_score = 1.0;

        let low = RiskAnalysis {
            level: RiskLevel::Low,
            strategy: Strategy::Normal,
            factors: RiskFactors::default(),
        };
        state.apply_penalties(&mut candidates, &low);
        assert_eq!(candidates[0].precision_score, 1.0);

        let medium = RiskAnalysis {
            level: RiskLevel::Medium,
            strategy: Strategy::ModerateDiversification,
            factors: RiskFactors::default(),
        };
        state.apply_penalties(&mut candidates, &medium);
        assert!(candidates[0].precision_score < 1.0);
        assert!(candidates[0].anti_repetition_penalty > 0.0);
    }

    #[test]
    fn test_novelty_bonus_at_high_risk_only() {
        let mut state = state();
        state.record_turn(
            "izin sorusu",
            "izin cevabı",
            &[used_chunk("izin kuralları", Some("leave"))],
            Strategy::Normal,
        );

        let fresh_category = || {
            let mut c = used_chunk("tamamen farklı konu", Some("travel"));
            c.precision_score = 1.0;
            c
        };
        let seen_category = || {
            let mut c = used_chunk("tamamen farklı konu", Some("leave"));
            c.precision_score = 1.0;
            c
        };

        let high = RiskAnalysis {
            level: RiskLevel::High,
            strategy: Strategy::AggressiveDiversification,
            factors: RiskFactors::default(),
        };

        let mut candidates = vec![fresh_category(), seen_category()];
        state.apply_penalties(&mut candidates, &high);
        assert!(candidates[0].precision_score > candidates[1].precision_score);
    }

    #[test]
    fn test_finalize_appends_suffix_on_repetition() {
        let mut state = state();
        state.record_turn(
            "izin sorusu",
            "izin başvurusu yazılı yapılır yönetici onaylar",
            &[],
            Strategy::Normal,
        );

        let repeated = state
            .finalize_answer("izin başvurusu yazılı yapılır yönetici onaylar".to_string());
        assert!(repeated.ends_with("*ek*"));

        let different = state.finalize_answer("maaş bordrosu ayın beşinde hazırlanır".to_string());
        assert!(!different.ends_with("*ek*"));
    }

    #[test]
    fn test_stagnation_requires_history() {
        let state = state();
        let short = vec![ChatMessage::user("izin")];
        assert_eq!(state.topic_stagnation(&short), 0.0);

        let stuck = vec![
            ChatMessage::user("izin kaç gün"),
            ChatMessage::assistant("14 gün"),
            ChatMessage::user("izin nasıl alınır"),
            ChatMessage::assistant("formla"),
            ChatMessage::user("izin ne zaman başlar"),
        ];
        assert!((state.topic_stagnation(&stuck) - 0.8).abs() < 1e-6);

        let moving = vec![
            ChatMessage::user("izin kaç gün"),
            ChatMessage::assistant("14 gün"),
            ChatMessage::user("maaş ne zaman yatar"),
            ChatMessage::assistant("ayın beşinde"),
            ChatMessage::user("eğitim bütçesi var mı"),
        ];
        assert!((state.topic_stagnation(&moving) - 0.2).abs() < 1e-6);
    }
}
