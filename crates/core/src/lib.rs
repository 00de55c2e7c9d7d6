//! Core primitives for the stake session tracker
//!
//! This crate provides:
//! - Content fingerprinting (BLAKE3)
//! - TTL-bounded caches with an injectable clock
//! - Project configuration (`.stake/config.toml`)
//! - Bookkeeping directory layout and atomic writes
//! - Best-effort telemetry sinks

pub mod cache;
pub mod clock;
pub mod config;
pub mod hash;
pub mod layout;
pub mod telemetry;

// Re-exports
pub use cache::{CacheLayer, TtlCache, TtlCell};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use hash::{fingerprint_file, Fingerprint, HashOutcome, BINARY_SENTINEL};
pub use layout::Layout;
pub use telemetry::{SharedTelemetry, TelemetrySink};
