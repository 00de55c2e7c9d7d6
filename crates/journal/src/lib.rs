//! Session ledger and semantic history
//!
//! This crate provides:
//! - Change / Stake / SessionState data model
//! - ChangeLedger: the persisted, cache-consistent session state
//! - StateLock: the cross-process lock around state writes
//! - SemanticHistory: append-only record of stakes and their summaries (sled)

pub mod history;
pub mod ledger;
pub mod lock;
pub mod model;

// Re-exports
pub use history::{HistoryRecord, HistorySink, SemanticHistory};
pub use ledger::ChangeLedger;
pub use lock::StateLock;
pub use model::{Change, SessionState, Stake};

/// Result type for journal operations
pub type Result<T> = anyhow::Result<T>;
