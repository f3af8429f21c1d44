//! sift-score - Wide-pass scoring
//!
//! The two first-stage retrieval signals: a BM25 lexical scorer with
//! query-aware bonuses, and a multi-metric embedding similarity scorer
//! (cosine, Euclidean, Manhattan, Jaccard, Pearson). Both passes are
//! pure functions over immutable per-request inputs and never error on
//! malformed records.

pub mod bm25;
pub mod vector;

pub use bm25::score_lexical;
pub use vector::{
    combined_similarity, cosine, euclidean_similarity, jaccard_similarity,
    manhattan_similarity, pearson, score_vectors,
};
