//! Checkpoint protocol
//!
//! ```text
//! Start ──► ChangesResolved ──► Summarized ──► Staged ──► Committed
//!   │             (empty)                        │  (stage/commit failed)
//!   └──────────────► Aborted ◄───────────────────┘
//! ```
//!
//! The ledger is only written after the VCS commit succeeds, and then only
//! the snapshot taken at the start is cleared. A failed attempt leaves the
//! ledger exactly as it was, so retrying is always safe. Once the commit
//! exists the stake counts as created even if the ledger write fails.

use crate::message::{fallback_summary, CommitMessageOptions};
use chrono::Utc;
use journal::{Change, ChangeLedger, HistoryRecord, HistorySink, Stake};
use parking_lot::Mutex;
use serde_json::json;
use stake_core::config::Config;
use stake_core::SharedTelemetry;
use std::sync::Arc;
use std::time::Duration;
use summarize::{summarize_bounded, SharedSummarizer};
use thiserror::Error;
use tokio::task::JoinHandle;
use vcs::{VcsError, VcsGateway};
use watcher::{ChangeDetector, DetectError};

#[derive(Debug, Error)]
pub enum StakeError {
    #[error("Stake name must not be empty")]
    EmptyName,

    /// Reconciling before the stake failed; nothing was committed
    #[error("Failed to reconcile pending changes: {0}")]
    Reconcile(#[from] DetectError),

    #[error(transparent)]
    Ledger(#[from] anyhow::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a stake attempt ended without a commit
#[derive(Debug)]
pub enum AbortReason {
    /// No pending changes, even after reconciling
    NothingToStake,
    StageFailed(VcsError),
    CommitFailed(VcsError),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::NothingToStake => write!(f, "nothing to stake"),
            AbortReason::StageFailed(e) => write!(f, "staging failed: {}", e),
            AbortReason::CommitFailed(e) => write!(f, "commit failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StakeReport {
    pub stake: Stake,
    pub commit_id: String,
    pub summary: String,
    /// The summary is the placeholder, not summarizer output
    pub summary_fallback: bool,
    /// The stake reached the ledger; when false the snapshot is still pending
    pub ledger_recorded: bool,
}

#[derive(Debug)]
pub enum StakeOutcome {
    Committed(StakeReport),
    Aborted(AbortReason),
}

#[derive(Debug, Clone)]
pub struct StakeOptions {
    /// Scan the VCS view once when nothing is pending
    pub auto_reconcile: bool,
    pub summary_timeout: Duration,
    pub message: CommitMessageOptions,
}

impl Default for StakeOptions {
    fn default() -> Self {
        Self {
            auto_reconcile: true,
            summary_timeout: Duration::from_secs(60),
            message: CommitMessageOptions::default(),
        }
    }
}

impl StakeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auto_reconcile: config.stake.auto_reconcile,
            summary_timeout: Duration::from_secs(config.stake.summary_timeout_secs),
            message: CommitMessageOptions::from_config(&config.stake),
        }
    }
}

pub struct StakeCoordinator {
    ledger: Arc<ChangeLedger>,
    detector: Arc<ChangeDetector>,
    vcs: Arc<VcsGateway>,
    summarizer: SharedSummarizer,
    history: Option<Arc<dyn HistorySink>>,
    telemetry: SharedTelemetry,
    options: StakeOptions,
    history_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StakeCoordinator {
    pub fn new(
        detector: Arc<ChangeDetector>,
        vcs: Arc<VcsGateway>,
        summarizer: SharedSummarizer,
        telemetry: SharedTelemetry,
        options: StakeOptions,
    ) -> Self {
        Self {
            ledger: Arc::clone(detector.ledger()),
            detector,
            vcs,
            summarizer,
            history: None,
            telemetry,
            options,
            history_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Record committed stakes in `sink`
    pub fn with_history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    /// Run the checkpoint protocol once
    ///
    /// Expected endings (nothing to do, VCS refused) are `Ok(Aborted(..))`.
    /// `Err` means reconciliation or the ledger itself failed.
    pub async fn create_stake(&self, name: &str, message: &str) -> Result<StakeOutcome, StakeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StakeError::EmptyName);
        }

        // Start -> ChangesResolved
        let snapshot = self.resolve_changes().await?;
        if snapshot.is_empty() {
            tracing::info!(name, "Nothing to stake");
            return Ok(StakeOutcome::Aborted(AbortReason::NothingToStake));
        }
        tracing::info!(name, changes = snapshot.len(), "Creating stake");

        // ChangesResolved -> Summarized
        let intent = self.ledger.intent();
        let (summary, summary_fallback) = match summarize_bounded(
            self.summarizer.as_ref(),
            &snapshot,
            intent.as_deref(),
            self.options.summary_timeout,
        )
        .await
        {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!(provider = self.summarizer.provider(), error = %e, "Summary unavailable, using placeholder");
                (fallback_summary(&e), true)
            }
        };

        // Summarized -> Staged
        let vcs = Arc::clone(&self.vcs);
        if let Err(e) = tokio::task::spawn_blocking(move || vcs.stage_all()).await? {
            tracing::warn!(name, error = %e, "Staging failed, stake aborted");
            return Ok(StakeOutcome::Aborted(AbortReason::StageFailed(e)));
        }

        // Staged -> Committed
        let title = self.options.message.title(name);
        let description = self.options.message.description(message, &summary, &snapshot);
        let vcs = Arc::clone(&self.vcs);
        let commit_id = match tokio::task::spawn_blocking(move || vcs.commit(&title, &description)).await? {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(name, error = %e, "Commit failed, stake aborted");
                return Ok(StakeOutcome::Aborted(AbortReason::CommitFailed(e)));
            }
        };

        let stake = Stake {
            name: name.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            changes: snapshot,
            commit_id: Some(commit_id.clone()),
        };
        let ledger = Arc::clone(&self.ledger);
        let recorded = stake.clone();
        let ledger_recorded = match tokio::task::spawn_blocking(move || ledger.record_stake(recorded)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(name, commit = %commit_id, error = %e, "Commit succeeded but the ledger was not updated");
                false
            }
            Err(e) => {
                tracing::warn!(name, commit = %commit_id, error = %e, "Ledger task failed after commit");
                false
            }
        };

        self.telemetry.record(
            "stake_created",
            json!({
                "name": stake.name,
                "commit": commit_id,
                "changes": stake.changes.len(),
                "summary_fallback": summary_fallback,
                "ledger_recorded": ledger_recorded,
            }),
        );
        tracing::info!(name, commit = %commit_id, "Stake created");

        self.record_history(&commit_id, &summary, &stake.changes, intent);

        Ok(StakeOutcome::Committed(StakeReport {
            stake,
            commit_id,
            summary,
            summary_fallback,
            ledger_recorded,
        }))
    }

    /// Wait for outstanding history writes
    pub async fn flush_history(&self) {
        let tasks: Vec<JoinHandle<()>> = self.history_tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "History task failed");
            }
        }
    }

    async fn resolve_changes(&self) -> Result<Vec<Change>, StakeError> {
        let ledger = Arc::clone(&self.ledger);
        let pending = tokio::task::spawn_blocking(move || ledger.pending_changes()).await?;
        if !pending.is_empty() || !self.options.auto_reconcile {
            return Ok(pending);
        }

        let detector = Arc::clone(&self.detector);
        let added = tokio::task::spawn_blocking(move || detector.scan_all_uncommitted()).await??;
        tracing::debug!(added, "Reconciled before stake");

        let ledger = Arc::clone(&self.ledger);
        Ok(tokio::task::spawn_blocking(move || ledger.pending_changes()).await?)
    }

    /// Best effort; the commit is already durable
    fn record_history(&self, commit_id: &str, summary: &str, changes: &[Change], intent: Option<String>) {
        let Some(sink) = self.history.clone() else {
            return;
        };
        let record = HistoryRecord::new(commit_id, summary, changes.to_vec(), intent)
            .with_source(self.summarizer.provider(), self.summarizer.model());

        let task = tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.append(&record) {
                tracing::warn!(commit = %record.commit_id, error = %e, "Failed to record semantic history");
            }
        });
        self.history_tasks.lock().push(task);
    }
}
