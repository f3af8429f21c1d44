//! Multi-metric embedding similarity.
//!
//! Every metric is a total function: dimension mismatches, empty vectors
//! and degenerate inputs score neutral (0.0) instead of panicking or
//! erroring, so one malformed record can never abort a batch.

use tracing::debug;

use sift_core::{Chunk, ScoredChunk, VectorConfig};

/// Cosine similarity in [-1, 1]; 0 when either norm is 0 or the
/// dimensions differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Euclidean similarity `1/(1+L2)` in (0, 1]; 0 on dimension mismatch.
pub fn euclidean_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let distance: f32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt();

    1.0 / (1.0 + distance)
}

/// Manhattan similarity `1/(1+L1)` in (0, 1]; 0 on dimension mismatch.
pub fn manhattan_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let distance: f32 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();

    1.0 / (1.0 + distance)
}

/// Jaccard similarity over the sets of positive dimensions.
pub fn jaccard_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut intersection = 0usize;
    let mut union = 0usize;

    for (x, y) in a.iter().zip(b) {
        let in_a = *x > 0.0;
        let in_b = *y > 0.0;
        if in_a && in_b {
            intersection += 1;
        }
        if in_a || in_b {
            union += 1;
        }
    }

    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Pearson correlation clamped to [-1, 1]; 0 when either vector has zero
/// variance or the dimensions differ.
pub fn pearson(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }

    let n = a.len() as f32;
    let mean_a: f32 = a.iter().sum::<f32>() / n;
    let mean_b: f32 = b.iter().sum::<f32>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }

    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

/// The configured similarity score for one chunk embedding.
///
/// Weighted sum of the enabled metrics in multi-metric mode, cosine only
/// otherwise.
pub fn combined_similarity(query: &[f32], chunk: &[f32], config: &VectorConfig) -> f32 {
    if !config.multi_metric {
        return cosine(query, chunk);
    }

    let w = &config.weights;
    cosine(query, chunk) * w.cosine
        + euclidean_similarity(query, chunk) * w.euclidean
        + manhattan_similarity(query, chunk) * w.manhattan
        + jaccard_similarity(query, chunk) * w.jaccard
        + pearson(query, chunk) * w.pearson
}

/// Score a corpus against a query embedding, highest first, truncated to
/// `top_k`. Never errors; chunks without a usable embedding score 0.
pub fn score_vectors(
    chunks: &[Chunk],
    query_embedding: &[f32],
    config: &VectorConfig,
    top_k: usize,
) -> Vec<ScoredChunk> {
    if chunks.is_empty() || query_embedding.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|chunk| {
            let score = combined_similarity(query_embedding, &chunk.embedding, config);
            ScoredChunk::vector(chunk.clone(), score)
        })
        .collect();

    sift_core::sort_descending_by(&mut scored, |c| c.vector_score);
    scored.truncate(top_k);

    debug!(candidates = scored.len(), "vector pass complete");
    scored
}
