//! sift-context - Context assembly
//!
//! Packs the final ranked chunks into a token-budgeted context string:
//! presentation-priority reordering, per-section metadata labels, a
//! header naming the question and recent history, and sentence-wise
//! truncation of the one chunk that overflows the budget. Token counting
//! is pluggable: an exact tokenizer-backed counter or a word-count
//! estimate.

pub mod assembler;
pub mod tokens;

pub use assembler::assemble;
pub use tokens::{HfTokenCounter, TokenCounter, WordEstimateCounter};
