//! sift-expand - Term extraction and query expansion
//!
//! Turns free text into normalized keyword sets and enriches queries with
//! synonyms, morphological variants, conversation context and domain
//! associations. All vocabulary lives in a serde data table (`Lexicon`)
//! so languages and domains can be swapped without code changes.

pub mod expander;
pub mod intent;
pub mod keywords;
pub mod lexicon;

pub use expander::{ExpandedQuery, QueryExpander};
pub use intent::{classify_intent, predict_categories, Intent};
pub use keywords::{extract_keywords, keyword_jaccard, word_jaccard};
pub use lexicon::Lexicon;
