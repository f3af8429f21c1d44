//! BM25 lexical scoring with query-aware bonuses.

use tracing::debug;

use sift_core::{Bm25Config, Chunk, ScoredChunk};
use sift_expand::ExpandedQuery;

/// Score a corpus against an expanded query.
///
/// Per chunk and term: `idf * tf*(k1+1) / (tf + k1*(1 - b + b*(len/avg_len)))`
/// with `idf = ln((N - df + 0.5)/(df + 0.5))`. Terms of the unexpanded
/// query are weighted `original_term_weight`. Additive bonuses reward
/// category-name matches, document-start matches, exact-phrase containment
/// and content in the optimal length band. Chunks at or below the score
/// floor are dropped; the rest are sorted descending and truncated.
///
/// An empty corpus or an empty term set yields an empty result, not an
/// error.
pub fn score_lexical(
    chunks: &[Chunk],
    query: &ExpandedQuery,
    config: &Bm25Config,
    top_k: usize,
) -> Vec<ScoredChunk> {
    if chunks.is_empty() || query.all_terms.is_empty() {
        return Vec::new();
    }

    let corpus_size = chunks.len();
    let lowered: Vec<String> = chunks.iter().map(|c| c.content.to_lowercase()).collect();
    let avg_len = lowered.iter().map(|c| c.len()).sum::<usize>() as f32 / corpus_size as f32;

    // Document frequency per term, over the same lowercased view that
    // term frequency uses.
    let doc_freq: Vec<usize> = query
        .all_terms
        .iter()
        .map(|term| lowered.iter().filter(|text| text.contains(term.as_str())).count())
        .collect();

    let phrase = query.original.to_lowercase();

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .zip(lowered.iter())
        .filter_map(|(chunk, text)| {
            let score = score_chunk(chunk, text, query, &doc_freq, corpus_size, avg_len, &phrase, config);
            if score > config.score_floor {
                Some(ScoredChunk::lexical(chunk.clone(), score))
            } else {
                None
            }
        })
        .collect();

    sift_core::sort_descending_by(&mut scored, |c| c.lexical_score);
    scored.truncate(top_k);

    debug!(candidates = scored.len(), corpus = corpus_size, "lexical pass complete");
    scored
}

#[allow(clippy::too_many_arguments)]
fn score_chunk(
    chunk: &Chunk,
    text: &str,
    query: &ExpandedQuery,
    doc_freq: &[usize],
    corpus_size: usize,
    avg_len: f32,
    phrase: &str,
    config: &Bm25Config,
) -> f32 {
    let doc_len = text.len() as f32;
    let mut score = 0.0;

    for (term, &df) in query.all_terms.iter().zip(doc_freq) {
        let tf = count_occurrences(text, term) as f32;
        if tf == 0.0 {
            continue;
        }

        let idf = ((corpus_size as f32 - df as f32 + 0.5) / (df as f32 + 0.5)).ln();
        let norm = tf + config.k1 * (1.0 - config.b + config.b * (doc_len / avg_len));
        let bm25 = idf * (tf * (config.k1 + 1.0)) / norm;

        let weight = if query.is_original_term(term) {
            config.original_term_weight
        } else {
            1.0
        };

        score += bm25 * weight;
    }

    // Category-name match bonus.
    if let Some(category) = &chunk.metadata.category {
        let category = category.to_lowercase();
        for term in &query.all_terms {
            if category.contains(term.as_str()) {
                score += config.category_bonus;
            }
        }
    }

    // Document-start (title/header area) bonus.
    let start: String = text.chars().take(config.doc_start_window).collect();
    for term in &query.all_terms {
        if start.contains(term.as_str()) {
            score += config.doc_start_bonus;
        }
    }

    // Exact-phrase containment.
    if !phrase.is_empty() && text.contains(phrase) {
        score += config.exact_phrase_bonus;
    }

    // Optimal length band.
    let char_len = chunk.content.len();
    if (200..2000).contains(&char_len) {
        score += config.length_bonus;
    }

    score
}

/// Non-overlapping substring occurrence count.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
