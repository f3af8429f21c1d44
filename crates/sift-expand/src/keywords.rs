//! Keyword extraction and overlap measures.

use std::collections::HashSet;

use crate::lexicon::Lexicon;

/// Extract normalized keywords from free text.
///
/// Lowercases (Unicode-aware, so Turkish letters survive), strips
/// non-alphanumeric edges, drops tokens of two characters or fewer and
/// anything in the stopword table. Order-preserving with first-occurrence
/// deduplication. Pure and deterministic; empty input yields an empty set.
pub fn extract_keywords(text: &str, lexicon: &Lexicon) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in text.split_whitespace() {
        let cleaned: String = token
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        if cleaned.chars().count() <= 2 || lexicon.is_stopword(&cleaned) {
            continue;
        }

        if seen.insert(cleaned.clone()) {
            keywords.push(cleaned);
        }
    }

    keywords
}

/// Jaccard overlap between the raw word sets of two texts.
///
/// Used by the diversity filter, where stopwords still count as overlap.
pub fn word_jaccard(a: &str, b: &str) -> f32 {
    let words_a: HashSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let words_b: HashSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();
    set_jaccard(&words_a, &words_b)
}

/// Jaccard overlap between the keyword sets of two texts.
pub fn keyword_jaccard(a: &str, b: &str, lexicon: &Lexicon) -> f32 {
    let set_a: HashSet<String> = extract_keywords(a, lexicon).into_iter().collect();
    let set_b: HashSet<String> = extract_keywords(b, lexicon).into_iter().collect();
    set_jaccard(&set_a, &set_b)
}

fn set_jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}
