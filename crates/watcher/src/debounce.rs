//! Per-path debouncing
//!
//! Editors write a file in bursts (truncate, write, rename, chmod). A path is
//! released once it has been quiet for the debounce window, so each burst
//! reaches the detector once.

use ahash::AHashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    /// Path -> time of the most recent event
    pending: AHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: AHashMap::new(),
        }
    }

    /// Record an event for `path` at `now`; restarts the path's window
    pub fn push(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now);
    }

    /// Remove and return every path quiet for at least the window
    pub fn drain_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready = Vec::new();
        self.pending.retain(|path, last| {
            if now.saturating_duration_since(*last) >= window {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    /// Earliest instant at which some pending path becomes ready
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().map(|last| *last + self.window)
    }

    /// Remove and return everything pending, ready or not
    pub fn flush(&mut self) -> Vec<PathBuf> {
        let mut all: Vec<PathBuf> = self.pending.drain().map(|(path, _)| path).collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
