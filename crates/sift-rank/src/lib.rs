//! sift-rank - Fusion, diversity and precision re-ranking
//!
//! Takes the two wide-pass result lists and narrows them to the final
//! selection: normalize-and-merge fusion, a greedy topical diversity
//! filter, then the ordered precision scoring passes. All stages are pure
//! functions `(candidates, ctx) -> candidates`.

pub mod diversity;
pub mod fusion;
pub mod precision;

pub use diversity::diversify;
pub use fusion::fuse;
pub use precision::{content_quality, context_coherence, query_relevance, RerankContext};
