//! sift-store - In-memory chunk store
//!
//! Brute-force store used by tests and small single-process deployments;
//! the production persistence layer lives behind the same `ChunkStore`
//! trait. Deduplicates near-identical content at insert using a
//! normalized content-prefix hash.

mod memory;

pub use memory::MemoryStore;
