//! Persisted session ledger
//!
//! `state.json` has one writer at a time across every process: each mutation
//! takes the in-process write lock and then the `flock` in `.stake/locks/`,
//! re-reads the file, applies the change, replaces the file atomically and
//! invalidates the state cache. Reads go through the cache and may be up to
//! the configured TTL stale.

use crate::lock::StateLock;
use crate::model::{Change, SessionState, Stake};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use stake_core::cache::{CacheClass, CacheLayer, TtlCell};
use stake_core::layout::{atomic_write, Layout};
use std::path::PathBuf;
use std::sync::Arc;

/// Owner of a project's persisted session state
pub struct ChangeLedger {
    state_path: PathBuf,
    locks_dir: PathBuf,
    cache: TtlCell<Arc<SessionState>>,
    write_lock: Mutex<()>,
}

impl ChangeLedger {
    /// Open the ledger for a project; does not touch the disk
    pub fn open(layout: &Layout, caches: &CacheLayer) -> Self {
        Self {
            state_path: layout.state_file(),
            locks_dir: layout.locks_dir(),
            cache: caches.singleton(CacheClass::SessionState),
            write_lock: Mutex::new(()),
        }
    }

    /// Bootstrap the bookkeeping directory and the initial state
    ///
    /// An existing state file is kept. A supplied intent replaces the stored one.
    pub fn init(layout: &Layout, caches: &CacheLayer, intent: Option<String>) -> Result<Self> {
        layout.bootstrap()?;
        let ledger = Self::open(layout, caches);

        let mut created = false;
        ledger.mutate(|state, existed| {
            if !existed {
                *state = SessionState::with_intent(intent);
                created = true;
                return true;
            }
            if intent.is_none() || state.intent == intent {
                return false;
            }
            state.intent = intent;
            true
        })?;
        if created {
            tracing::info!(path = %ledger.state_path.display(), "Created session state");
        }
        Ok(ledger)
    }

    pub fn state_path(&self) -> &std::path::Path {
        &self.state_path
    }

    /// Current state, served from cache while fresh
    ///
    /// An unreadable file reads as the empty state here; writes refuse it.
    pub fn state(&self) -> Arc<SessionState> {
        self.cache.get_or_compute(|| {
            let state = self.load_from_disk().unwrap_or_else(|e| {
                tracing::warn!(path = %self.state_path.display(), error = %e, "Unreadable session state, showing empty state");
                SessionState::default()
            });
            Arc::new(state)
        })
    }

    pub fn intent(&self) -> Option<String> {
        self.state().intent.clone()
    }

    pub fn pending_changes(&self) -> Vec<Change> {
        self.state().pending_changes.clone()
    }

    pub fn stakes(&self) -> Vec<Stake> {
        self.state().stakes.clone()
    }

    pub fn set_intent(&self, intent: Option<String>) -> Result<()> {
        self.mutate(|state, _| {
            if state.intent == intent {
                return false;
            }
            state.intent = intent;
            true
        })?;
        Ok(())
    }

    /// Append a change unless its path is already pending
    ///
    /// The check runs against the state on disk, under the write lock, not
    /// against the cache. Returns whether the change was appended.
    pub fn append_if_new(&self, change: Change) -> Result<bool> {
        self.mutate(|state, _| {
            if state.is_pending(&change.path) {
                return false;
            }
            state.pending_changes.push(change);
            true
        })
    }

    /// Append a batch of changes in one write, skipping paths already pending
    ///
    /// Returns the number appended.
    pub fn append_new_paths(&self, changes: Vec<Change>) -> Result<usize> {
        let mut added = 0;
        self.mutate(|state, _| {
            for change in changes {
                if !state.is_pending(&change.path) {
                    state.pending_changes.push(change);
                    added += 1;
                }
            }
            added > 0
        })?;
        Ok(added)
    }

    /// Append a stake and drop exactly the changes it snapshotted
    ///
    /// Changes appended after the snapshot was taken stay pending.
    pub fn record_stake(&self, stake: Stake) -> Result<()> {
        self.mutate(|state, _| {
            state
                .pending_changes
                .retain(|pending| !stake.changes.contains(pending));
            state.stakes.push(stake);
            true
        })?;
        Ok(())
    }

    /// Drop every pending change; returns how many were dropped
    pub fn reset_pending(&self) -> Result<usize> {
        let mut dropped = 0;
        self.mutate(|state, _| {
            dropped = state.pending_changes.len();
            state.pending_changes.clear();
            dropped > 0
        })?;
        Ok(dropped)
    }

    /// Read-modify-write under the write lock and the state `flock`
    ///
    /// `apply` gets the state and whether the file existed, and returns
    /// whether it changed anything; unchanged state is not rewritten. A file
    /// that exists but cannot be read fails the write instead of being
    /// replaced.
    fn mutate(&self, apply: impl FnOnce(&mut SessionState, bool) -> bool) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let _lock = StateLock::acquire(&self.locks_dir)?;
        // Another process may have written since our last read
        self.cache.invalidate();

        let existed = self.state_path.exists();
        let mut state = self.load_from_disk()?;
        let changed = apply(&mut state, existed);
        if changed {
            self.save(&state)?;
        }
        Ok(changed)
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state).context("Failed to serialize session state")?;
        atomic_write(&self.state_path, &json)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Missing or corrupt state is the empty default; other read errors fail
    fn load_from_disk(&self) -> Result<SessionState> {
        let bytes = match std::fs::read(&self.state_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionState::default()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read session state: {}", self.state_path.display())
                })
            }
        };

        Ok(match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                let backup = self.state_path.with_extension("json.corrupt");
                tracing::warn!(
                    path = %self.state_path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Corrupt session state, using empty state"
                );
                if let Err(e) = std::fs::write(&backup, &bytes) {
                    tracing::warn!(backup = %backup.display(), error = %e, "Failed to back up corrupt session state");
                }
                SessionState::default()
            }
        })
    }
}
