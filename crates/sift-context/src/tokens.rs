//! Pluggable token counting.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::warn;

use sift_core::{Result, SiftError};

/// Token counting strategy for context budgeting.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Approximate counter: `ceil(words * 1.3)`.
///
/// The default when no tokenizer file is configured; over-counting
/// slightly is preferable to blowing the generator's window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordEstimateCounter;

impl TokenCounter for WordEstimateCounter {
    fn count(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words as f32 * 1.3).ceil() as usize
    }
}

/// Exact counter backed by a `tokenizer.json` file.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Load a tokenizer from a HuggingFace `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| SiftError::config(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                // Tokenization failure degrades to the estimate.
                warn!("tokenizer failed, falling back to word estimate: {}", e);
                WordEstimateCounter.count(text)
            }
        }
    }
}
