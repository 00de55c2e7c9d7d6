//! Stake (checkpoint) creation
//!
//! A stake bundles the pending changes into one VCS commit with a
//! summarized description, then records it in the session ledger.

pub mod coordinator;
pub mod message;

pub use coordinator::{AbortReason, StakeCoordinator, StakeError, StakeOptions, StakeOutcome, StakeReport};
pub use message::{CommitMessageOptions, FALLBACK_MARKER};
