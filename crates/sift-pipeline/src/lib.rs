//! sift-pipeline - Per-query orchestration
//!
//! Sequences the retrieval stages for one question: risk analysis, query
//! expansion, the concurrent lexical and vector wide passes, hybrid
//! fusion, diversity filtering, precision re-ranking with anti-repetition
//! adjustment, and context assembly. `retrieve_context` is the narrow
//! boundary of the core; `answer` composes it with a `Generator` at the
//! application edge.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_pipeline::RetrievalPipeline;
//! use std::sync::Arc;
//!
//! let pipeline = RetrievalPipeline::new(Arc::new(store), Arc::new(embedder), config);
//! let retrieved = pipeline.retrieve_context("izin kaç gün?", &history).await?;
//! ```

mod answer;
mod engine;
mod prompt;

pub use answer::{Answer, AnswerMetadata, SourceRef};
pub use engine::RetrievalPipeline;
pub use prompt::build_directive;

// Re-export for convenience
pub use sift_core::{RetrievedContext, SiftConfig, Strategy};
