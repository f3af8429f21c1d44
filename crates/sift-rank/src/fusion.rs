//! Hybrid fusion of the vector and keyword result lists.

use std::collections::HashMap;

use tracing::debug;

use sift_core::{FusionConfig, ScoredChunk};

/// Fuse the vector and keyword lists into one ranking.
///
/// Each list is normalized to [0, 1] by its own maximum and contributes
/// `weight * normalized + position_bonus`, the position bonus decaying
/// linearly from `position_bonus` at the top of a list to 0 at its tail.
/// Chunks appearing in both lists get a fixed agreement bonus. Merged by
/// stable id (content-prefix fallback when ids are missing), sorted
/// descending, truncated to `top_k`.
///
/// Commutative over its two inputs: branch completion order never
/// changes the result.
pub fn fuse(
    vector_results: Vec<ScoredChunk>,
    keyword_results: Vec<ScoredChunk>,
    config: &FusionConfig,
    top_k: usize,
) -> Vec<ScoredChunk> {
    let mut merged: HashMap<String, ScoredChunk> = HashMap::new();

    let vector_norm = max_score(&vector_results, |c| c.vector_score);
    let vector_len = vector_results.len();
    for (index, mut candidate) in vector_results.into_iter().enumerate() {
        let normalized = normalize(candidate.vector_score, vector_norm);
        candidate.fused_score =
            normalized * config.vector_weight + position_bonus(index, vector_len, config);
        merged.insert(candidate.key(), candidate);
    }

    let keyword_norm = max_score(&keyword_results, |c| c.lexical_score);
    let keyword_len = keyword_results.len();
    for (index, candidate) in keyword_results.into_iter().enumerate() {
        let normalized = normalize(candidate.lexical_score, keyword_norm);
        let contribution =
            normalized * config.keyword_weight + position_bonus(index, keyword_len, config);

        match merged.get_mut(&candidate.key()) {
            Some(existing) => {
                // Present in both lists: add the keyword contribution and
                // the agreement bonus.
                existing.fused_score += contribution + config.agreement_bonus;
                existing.lexical_score = candidate.lexical_score;
                existing.from_keyword = true;
            }
            None => {
                let mut candidate = candidate;
                candidate.fused_score = contribution;
                merged.insert(candidate.key(), candidate);
            }
        }
    }

    let mut fused: Vec<ScoredChunk> = merged.into_values().collect();
    sift_core::sort_descending_by(&mut fused, |c| c.fused_score);
    fused.truncate(top_k);

    debug!(fused = fused.len(), "hybrid fusion complete");
    fused
}

fn max_score<F>(results: &[ScoredChunk], score: F) -> f32
where
    F: Fn(&ScoredChunk) -> f32,
{
    results.iter().map(&score).fold(0.0_f32, f32::max)
}

fn normalize(score: f32, max: f32) -> f32 {
    if max > 0.0 {
        score / max
    } else {
        0.0
    }
}

/// Linear decay from `position_bonus` at rank 0 towards 0 at the list
/// tail.
fn position_bonus(index: usize, list_len: usize, config: &FusionConfig) -> f32 {
    let len = list_len.max(1) as f32;
    let remaining = (len - index as f32).max(0.0);
    remaining / len * config.position_bonus
}
