//! Greedy topical diversity filtering.

use std::collections::HashMap;

use tracing::debug;

use sift_core::{DiversityConfig, ScoredChunk};
use sift_expand::word_jaccard;

/// Category used when a chunk carries none.
const UNCATEGORIZED: &str = "unknown";

/// Single greedy pass over the fused list in score order.
///
/// A chunk is skipped once its category has `max_per_category` accepted
/// entries, or when its word-Jaccard overlap with any already-accepted
/// chunk exceeds `threshold`. O(k²) over a shortlist of tens of items.
pub fn diversify(ranked: Vec<ScoredChunk>, config: &DiversityConfig) -> Vec<ScoredChunk> {
    if !config.enabled {
        return ranked;
    }

    let mut accepted: Vec<ScoredChunk> = Vec::with_capacity(ranked.len());
    let mut per_category: HashMap<String, usize> = HashMap::new();

    for candidate in ranked {
        let category = candidate
            .chunk
            .metadata
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let count = per_category.entry(category).or_insert(0);
        if *count >= config.max_per_category {
            continue;
        }

        let too_similar = accepted.iter().any(|kept| {
            word_jaccard(&candidate.chunk.content, &kept.chunk.content) > config.threshold
        });
        if too_similar {
            continue;
        }

        *count += 1;
        accepted.push(candidate);
    }

    debug!(accepted = accepted.len(), "diversity filter complete");
    accepted
}
