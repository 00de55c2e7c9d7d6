//! Ledger data model
//!
//! Field names on disk follow the `state.json` layout:
//! `{intent, changes: [{file, hash, timestamp, summary}], stakes: [{name, message, timestamp, changes}]}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stake_core::Fingerprint;
use std::path::Path;

/// A detected, not-yet-staked modification to a tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Repo-relative path, `/`-separated
    #[serde(rename = "file")]
    pub path: String,
    /// Content fingerprint (or the binary sentinel)
    #[serde(rename = "hash")]
    pub fingerprint: Fingerprint,
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
    /// Derived one-liner, e.g. "Changed main.rs"
    pub summary: String,
}

impl Change {
    pub fn new(path: impl Into<String>, fingerprint: Fingerprint, observed_at: DateTime<Utc>) -> Self {
        let path = path.into();
        let summary = describe(&path);
        Self {
            path,
            fingerprint,
            observed_at,
            summary,
        }
    }

    /// Change observed now
    pub fn observed_now(path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self::new(path, fingerprint, Utc::now())
    }
}

fn describe(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    format!("Changed {}", name)
}

/// A user-triggered checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub name: String,
    pub message: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Snapshot of the pending changes the stake bundled
    pub changes: Vec<Change>,
    /// VCS commit the stake produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

/// Everything persisted for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// What the user is building
    pub intent: Option<String>,
    /// Pending changes, oldest observation first
    #[serde(rename = "changes")]
    pub pending_changes: Vec<Change>,
    pub stakes: Vec<Stake>,
}

impl SessionState {
    pub fn with_intent(intent: Option<String>) -> Self {
        Self {
            intent,
            ..Self::default()
        }
    }

    /// Whether `path` already has a pending change
    pub fn is_pending(&self, path: &str) -> bool {
        self.pending_changes.iter().any(|c| c.path == path)
    }

    pub fn last_stake(&self) -> Option<&Stake> {
        self.stakes.last()
    }
}
