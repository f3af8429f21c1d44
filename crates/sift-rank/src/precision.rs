//! Precision re-ranking passes.
//!
//! Ordered, pure scoring passes over the diversified shortlist. Each pass
//! takes and returns the candidate vector, updating `precision_score`;
//! composition happens in the pipeline so every pass stays independently
//! testable. The anti-repetition pass lives in the session crate and runs
//! between content quality and the final truncation.

use tracing::debug;

use sift_core::{ChatMessage, Role, ScoredChunk};
use sift_expand::{classify_intent, extract_keywords, predict_categories, ExpandedQuery, Lexicon};

/// Bonus for containing the exact original query phrase.
const EXACT_PHRASE_BONUS: f32 = 1.5;

/// Per-occurrence weight for original query terms.
const ORIGINAL_TERM_WEIGHT: f32 = 0.4;

/// Per-occurrence weight for expansion-only terms.
const EXPANSION_TERM_WEIGHT: f32 = 0.15;

/// Weight of the term-coverage ratio.
const COVERAGE_WEIGHT: f32 = 0.8;

/// Per-term bonus for matches in the document-start window.
const DOC_START_BONUS: f32 = 0.6;

/// Document-start window in characters.
const DOC_START_WINDOW: usize = 150;

/// Per-keyword weight of intent alignment, scaled by intent confidence.
const INTENT_WEIGHT: f32 = 0.4;

/// Bonus when the chunk category is among the predicted categories.
const CATEGORY_ALIGNMENT_BONUS: f32 = 0.6;

/// Per-term weight of history alignment, scaled by term importance.
const HISTORY_TERM_WEIGHT: f32 = 0.2;

/// Importance of terms from the current question vs older user turns.
const CURRENT_IMPORTANCE: f32 = 1.0;
const HISTORY_IMPORTANCE: f32 = 0.6;

/// User turns consulted for history alignment.
const HISTORY_TURNS: usize = 3;

/// Everything the precision passes need besides the candidates.
pub struct RerankContext<'a> {
    pub expanded: &'a ExpandedQuery,
    pub history: &'a [ChatMessage],
    pub lexicon: &'a Lexicon,
    /// Current time in Unix millis, injected for deterministic tests.
    pub now_ms: u64,
}

/// Pass 1: query-document relevance.
///
/// Seeds `precision_score` from the fused score, then rewards exact
/// phrase containment, per-term occurrence counts (original terms weigh
/// more than expansion terms), term coverage and document-start matches.
pub fn query_relevance(
    mut candidates: Vec<ScoredChunk>,
    ctx: &RerankContext<'_>,
) -> Vec<ScoredChunk> {
    let phrase = ctx.expanded.original.to_lowercase();
    let original_terms = &ctx.expanded.original_terms;

    for candidate in &mut candidates {
        let text = candidate.chunk.content.to_lowercase();
        let mut score = candidate.fused_score;

        if !phrase.is_empty() && text.contains(&phrase) {
            score += EXACT_PHRASE_BONUS;
        }

        let mut term_matches = 0usize;
        for term in &ctx.expanded.all_terms {
            let occurrences = text.matches(term.as_str()).count();
            if occurrences == 0 {
                continue;
            }

            let weight = if ctx.expanded.is_original_term(term) {
                term_matches += occurrences;
                ORIGINAL_TERM_WEIGHT
            } else {
                EXPANSION_TERM_WEIGHT
            };
            score += occurrences as f32 * weight;
        }

        if !original_terms.is_empty() {
            let coverage = term_matches as f32 / original_terms.len() as f32;
            score += coverage * COVERAGE_WEIGHT;
        }

        let start: String = text.chars().take(DOC_START_WINDOW).collect();
        for term in original_terms {
            if start.contains(term.as_str()) {
                score += DOC_START_BONUS;
            }
        }

        candidate.precision_score = score;
    }

    candidates
}

/// Pass 2: context coherence.
///
/// Aligns candidates with the classified question intent, the predicted
/// categories and recency-weighted conversation terms.
pub fn context_coherence(
    mut candidates: Vec<ScoredChunk>,
    ctx: &RerankContext<'_>,
) -> Vec<ScoredChunk> {
    let intent = classify_intent(&ctx.expanded.original, ctx.lexicon);
    let predicted = predict_categories(&ctx.expanded.original, ctx.lexicon);

    // Current-question terms first, then terms pulled from the last few
    // user turns at reduced importance.
    let mut weighted_terms: Vec<(String, f32)> = ctx
        .expanded
        .original_terms
        .iter()
        .map(|t| (t.clone(), CURRENT_IMPORTANCE))
        .collect();

    let history_text: String = ctx
        .history
        .iter()
        .filter(|m| m.role == Role::User)
        .rev()
        .take(HISTORY_TURNS)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    for term in extract_keywords(&history_text, ctx.lexicon) {
        if !weighted_terms.iter().any(|(t, _)| *t == term) {
            weighted_terms.push((term, HISTORY_IMPORTANCE));
        }
    }

    for candidate in &mut candidates {
        let text = candidate.chunk.content.to_lowercase();
        let mut score = candidate.precision_score;

        if intent.confidence > 0.0 {
            for keyword in &intent.keywords {
                if text.contains(keyword.as_str()) {
                    score += INTENT_WEIGHT * intent.confidence;
                }
            }
        }

        if let Some(category) = &candidate.chunk.metadata.category {
            if predicted.iter().any(|p| p == category) {
                score += CATEGORY_ALIGNMENT_BONUS;
            }
        }

        for (term, importance) in &weighted_terms {
            if text.contains(term.as_str()) {
                score += HISTORY_TERM_WEIGHT * importance;
            }
        }

        candidate.precision_score = score;
    }

    candidates
}

/// Pass 3: content quality.
///
/// Rewards the length sweet spot, sentence structure, lexical diversity,
/// authoritative document kinds and recent content; penalizes fragments.
pub fn content_quality(
    mut candidates: Vec<ScoredChunk>,
    ctx: &RerankContext<'_>,
) -> Vec<ScoredChunk> {
    for candidate in &mut candidates {
        let content = &candidate.chunk.content;
        let mut score = candidate.precision_score;

        let length = content.chars().count();
        if (100..=1200).contains(&length) {
            score += 0.3;
        } else if length < 50 {
            score *= 0.7;
        }

        let sentences = content
            .split(['.', '!', '?'])
            .filter(|s| s.trim().chars().count() > 10)
            .count();
        if (2..=8).contains(&sentences) {
            score += 0.25;
        }

        let words: Vec<String> = content
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .map(String::from)
            .collect();
        if !words.is_empty() {
            let unique: std::collections::HashSet<&String> = words.iter().collect();
            if unique.len() as f32 / words.len() as f32 > 0.4 {
                score += 0.2;
            }
        }

        if candidate.chunk.metadata.is_authoritative() {
            score += 0.4;
        }

        if candidate.chunk.created_at > 0 {
            let age_days =
                ctx.now_ms.saturating_sub(candidate.chunk.created_at) as f32 / 86_400_000.0;
            if age_days < 30.0 {
                score += 0.3;
            } else if age_days < 90.0 {
                score += 0.15;
            }
        }

        candidate.precision_score = score;
    }

    debug!(candidates = candidates.len(), "precision passes complete");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sift_core::{Chunk, ChunkMetadata, ExpansionConfig};
    use sift_expand::QueryExpander;

    const NOW_MS: u64 = 1_750_000_000_000;

    fn expand(question: &str) -> ExpandedQuery {
        QueryExpander::new(Arc::new(Lexicon::default()), ExpansionConfig::default())
            .expand(question, &[])
    }

    fn candidate(content: &str, category: Option<&str>, fused: f32) -> ScoredChunk {
        let mut chunk = Chunk::new(
            content,
            ChunkMetadata {
                category: category.map(String::from),
                ..Default::default()
            },
        );
        chunk.created_at = NOW_MS; // fresh by default
        let mut scored = ScoredChunk::lexical(chunk, fused);
        scored.fused_score = fused;
        scored
    }

    fn ctx<'a>(
        expanded: &'a ExpandedQuery,
        history: &'a [ChatMessage],
        lexicon: &'a Lexicon,
    ) -> RerankContext<'a> {
        RerankContext {
            expanded,
            history,
            lexicon,
            now_ms: NOW_MS,
        }
    }

    #[test]
    fn test_query_relevance_prefers_matching_chunk() {
        let expanded = expand("izin süresi");
        let lexicon = Lexicon::default();
        let ctx = ctx(&expanded, &[], &lexicon);

        let candidates = vec![
            candidate("izin süresi yılda on dört gündür", None, 0.5),
            candidate("ofis ekipmanı rezervasyonu", None, 0.5),
        ];

        let ranked = query_relevance(candidates, &ctx);
        assert!(ranked[0].precision_score > ranked[1].precision_score);
    }

    #[test]
    fn test_query_relevance_exact_phrase() {
        let expanded = expand("izin süresi");
        let lexicon = Lexicon::default();
        let ctx = ctx(&expanded, &[], &lexicon);

        let with_phrase = candidate("tam olarak izin süresi burada", None, 0.0);
        let scattered = candidate("izin başka yerde süresi başka", None, 0.0);

        let ranked = query_relevance(vec![scattered, with_phrase], &ctx);
        let phrase_score = ranked
            .iter()
            .find(|c| c.chunk.content.contains("tam olarak"))
            .unwrap()
            .precision_score;
        let scattered_score = ranked
            .iter()
            .find(|c| c.chunk.content.contains("başka yerde"))
            .unwrap()
            .precision_score;
        assert!(phrase_score > scattered_score);
    }

    #[test]
    fn test_context_coherence_category_alignment() {
        let expanded = expand("yıllık izin hakkım nedir");
        let lexicon = Lexicon::default();
        let ctx = ctx(&expanded, &[], &lexicon);

        let aligned = candidate("çalışanlar senede bir kez dinlenir", Some("leave_vacation"), 0.0);
        let other = candidate("çalışanlar senede bir kez dinlenir", Some("travel"), 0.0);

        let ranked = context_coherence(vec![aligned, other], &ctx);
        let aligned_score = ranked
            .iter()
            .find(|c| c.chunk.metadata.category.as_deref() == Some("leave_vacation"))
            .unwrap()
            .precision_score;
        let other_score = ranked
            .iter()
            .find(|c| c.chunk.metadata.category.as_deref() == Some("travel"))
            .unwrap()
            .precision_score;
        assert!(aligned_score > other_score);
    }

    #[test]
    fn test_context_coherence_history_terms() {
        let expanded = expand("devam edelim");
        let lexicon = Lexicon::default();
        let history = vec![
            ChatMessage::user("bordro kesintileri nasıl hesaplanır"),
            ChatMessage::assistant("şöyle hesaplanır"),
        ];
        let ctx = ctx(&expanded, &history, &lexicon);

        let on_topic = candidate("bordro kesintileri vergiye bağlıdır", None, 0.0);
        let off_topic = candidate("ofis masası rezervasyonu", None, 0.0);

        let ranked = context_coherence(vec![off_topic, on_topic], &ctx);
        let on_score = ranked
            .iter()
            .find(|c| c.chunk.content.contains("bordro"))
            .unwrap()
            .precision_score;
        let off_score = ranked
            .iter()
            .find(|c| c.chunk.content.contains("masası"))
            .unwrap()
            .precision_score;
        assert!(on_score > off_score);
    }

    #[test]
    fn test_content_quality_rewards_structure_and_kind() {
        let expanded = expand("izin");
        let lexicon = Lexicon::default();
        let ctx = ctx(&expanded, &[], &lexicon);

        let strong_text = "İzin başvurusu yazılı yapılır ve yönetici onayı gerekir. \
                           Onaylanan izinler sisteme işlenir ve bordroya yansır. \
                           İptal durumunda üç gün önceden haber verilmelidir.";
        let mut strong = candidate(strong_text, None, 0.0);
        strong.chunk.metadata.kind = Some("policy".to_string());

        let weak = candidate("izin", None, 0.0);

        let ranked = content_quality(vec![weak, strong], &ctx);
        let strong_score = ranked
            .iter()
            .find(|c| c.chunk.content.contains("başvurusu"))
            .unwrap()
            .precision_score;
        let weak_score = ranked
            .iter()
            .find(|c| c.chunk.content == "izin")
            .unwrap()
            .precision_score;
        assert!(strong_score > weak_score);
    }

    #[test]
    fn test_content_quality_age_decay() {
        let expanded = expand("izin");
        let lexicon = Lexicon::default();
        let ctx = ctx(&expanded, &[], &lexicon);

        let mut fresh = candidate("aynı içerik uzunluğu ve yapısı", None, 0.0);
        fresh.chunk.created_at = NOW_MS - 86_400_000; // 1 day
        let mut stale = candidate("aynı içerik uzunluğu ve yapısı", None, 0.0);
        stale.chunk.created_at = NOW_MS - 200 * 86_400_000; // 200 days

        let ranked = content_quality(vec![stale, fresh], &ctx);
        let fresh_score = ranked
            .iter()
            .find(|c| c.chunk.created_at > NOW_MS - 2 * 86_400_000)
            .unwrap()
            .precision_score;
        let stale_score = ranked
            .iter()
            .find(|c| c.chunk.created_at < NOW_MS - 100 * 86_400_000)
            .unwrap()
            .precision_score;
        assert!(fresh_score > stale_score);
    }

    #[test]
    fn test_passes_are_deterministic() {
        let expanded = expand("izin süresi nedir");
        let lexicon = Lexicon::default();
        let history = vec![ChatMessage::user("daha önce sormuştum")];
        let ctx = ctx(&expanded, &history, &lexicon);

        let build = || {
            vec![
                candidate("izin süresi yılda on dört gündür", Some("leave_vacation"), 0.4),
                candidate("maaşlar ayın beşinde ödenir", Some("salary_benefits"), 0.3),
            ]
        };

        let run = |candidates| {
            content_quality(context_coherence(query_relevance(candidates, &ctx), &ctx), &ctx)
        };

        let first: Vec<f32> = run(build()).iter().map(|c| c.precision_score).collect();
        let second: Vec<f32> = run(build()).iter().map(|c| c.precision_score).collect();
        assert_eq!(first, second);
    }
}
