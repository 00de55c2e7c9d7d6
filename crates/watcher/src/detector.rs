//! Change detection
//!
//! Turns raw filesystem notifications (or a full scan of the VCS view) into
//! deduplicated `Change` records. Only paths the VCS reports as uncommitted
//! are ever recorded; everything else is dropped without touching the ledger.

use journal::{Change, ChangeLedger};
use serde_json::json;
use stake_core::cache::CacheClass;
use stake_core::{
    fingerprint_file, CacheLayer, Fingerprint, HashOutcome, Layout, SharedTelemetry, TtlCache,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use vcs::{VcsError, VcsGateway};

use crate::ignore::IgnoreRules;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The VCS view could not be read; nothing was recorded
    #[error("Failed to read uncommitted paths: {0}")]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

/// What `handle_event` did with a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    /// A new pending change was appended
    Recorded(Change),
    /// Outside the root, in the bookkeeping directory, or matched by ignore rules
    Ignored,
    /// Not in the VCS uncommitted view
    Untracked,
    /// The path already has a pending change
    Duplicate,
    /// The file no longer exists
    Vanished,
}

impl DetectOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, DetectOutcome::Recorded(_))
    }
}

pub struct ChangeDetector {
    layout: Layout,
    ledger: Arc<ChangeLedger>,
    vcs: Arc<VcsGateway>,
    hashes: TtlCache<String, Fingerprint>,
    telemetry: SharedTelemetry,
    ignore: Option<IgnoreRules>,
}

impl ChangeDetector {
    pub fn new(
        layout: Layout,
        ledger: Arc<ChangeLedger>,
        vcs: Arc<VcsGateway>,
        caches: &CacheLayer,
        telemetry: SharedTelemetry,
    ) -> Self {
        Self {
            layout,
            ledger,
            vcs,
            hashes: caches.keyed(CacheClass::FileHash),
            telemetry,
            ignore: None,
        }
    }

    /// Drop events matched by `rules` before hashing
    pub fn with_ignore_rules(mut self, rules: IgnoreRules) -> Self {
        self.ignore = Some(rules);
        self
    }

    pub fn ledger(&self) -> &Arc<ChangeLedger> {
        &self.ledger
    }

    /// Process one "modified" notification
    ///
    /// `path` may be absolute (under the project root) or repo-relative.
    pub fn handle_event(&self, path: &Path) -> Result<DetectOutcome, DetectError> {
        let Some(relative) = self.layout.relativize(path) else {
            tracing::debug!(path = %path.display(), "Event outside project root");
            return Ok(DetectOutcome::Ignored);
        };
        if self.layout.is_bookkeeping(&relative) {
            return Ok(DetectOutcome::Ignored);
        }
        if let Some(rules) = &self.ignore {
            if rules.should_ignore(&relative) {
                tracing::debug!(path = %relative, "Ignored by rules");
                return Ok(DetectOutcome::Ignored);
            }
        }

        // The file just changed; whatever is cached for it is stale
        self.hashes.invalidate(&relative);
        let Some(fingerprint) = self.fingerprint(&relative) else {
            tracing::debug!(path = %relative, "File vanished before hashing");
            return Ok(DetectOutcome::Vanished);
        };

        let uncommitted = self.vcs.uncommitted_paths()?;
        if !uncommitted.contains(&relative) {
            tracing::debug!(path = %relative, "Not in VCS view, dropped");
            return Ok(DetectOutcome::Untracked);
        }

        let change = Change::observed_now(relative, fingerprint);
        if !self.ledger.append_if_new(change.clone())? {
            return Ok(DetectOutcome::Duplicate);
        }

        self.telemetry.record(
            "file_change",
            json!({"file": change.path, "hash": change.fingerprint.as_str()}),
        );
        tracing::info!(path = %change.path, hash = %change.fingerprint, "Change recorded");
        Ok(DetectOutcome::Recorded(change))
    }

    /// Record every uncommitted path that has no pending change yet
    ///
    /// Reads the VCS view fresh. Returns the number of changes added; a second
    /// call with no intervening activity adds zero.
    pub fn scan_all_uncommitted(&self) -> Result<usize, DetectError> {
        let uncommitted = self.vcs.fresh_uncommitted_paths()?;

        // Pending paths are filtered by the ledger under its write lock
        let mut candidates = Vec::new();
        for path in uncommitted.iter() {
            if self.layout.is_bookkeeping(path) {
                continue;
            }
            match self.fingerprint(path) {
                Some(fingerprint) => candidates.push(Change::observed_now(path, fingerprint)),
                // Deleted files show up as uncommitted but have nothing to hash
                None => tracing::debug!(path, "Skipping missing file during scan"),
            }
        }

        let added = self.ledger.append_new_paths(candidates)?;
        if added > 0 {
            self.telemetry
                .record("scan_completed", json!({"added": added, "uncommitted": uncommitted.len()}));
        }
        tracing::info!(added, uncommitted = uncommitted.len(), "Scan complete");
        Ok(added)
    }

    /// Fingerprint through the file-hash cache; `None` if the file is missing
    fn fingerprint(&self, relative: &str) -> Option<Fingerprint> {
        let key = relative.to_string();
        self.hashes
            .get_or_try_compute(&key, || {
                match fingerprint_file(&self.layout.root().join(relative)) {
                    HashOutcome::Present(fingerprint) => Ok(fingerprint),
                    HashOutcome::Missing => Err(()),
                }
            })
            .ok()
    }
}
