//! sift-session - Anti-repetition engine
//!
//! Session-scoped memory of past questions, answers and chunk usage,
//! plus the risk analysis that turns it into a retrieval strategy. The
//! state is explicit and owned by the caller (one per session), mutated
//! by a single end-of-query update, so sessions stay isolated and tests
//! stay deterministic. Losing the state only degrades diversification,
//! never correctness.

pub mod risk;
pub mod state;

pub use risk::{RiskAnalysis, RiskFactors};
pub use state::{MemoryEntry, SessionState, TermUsage};
