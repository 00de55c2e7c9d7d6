//! File system watching for the stake tracker
//!
//! This crate provides:
//! - `FsWatcher`: recursive notify watcher forwarding paths over a channel
//! - Per-path debouncing
//! - Ignore rules (built-in, .gitignore, configured patterns)
//! - `ChangeDetector`: event/scan → deduplicated ledger changes
//! - Periodic reconciliation and the event pipeline

pub mod debounce;
pub mod detector;
pub mod ignore;
pub mod pipeline;
pub mod reconcile;

pub use debounce::Debouncer;
pub use detector::{ChangeDetector, DetectError, DetectOutcome};
pub use ignore::IgnoreRules;
pub use pipeline::{run_pipeline, PipelineStats};
pub use reconcile::PeriodicReconciler;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Recursive watcher over a project root
///
/// Dropping the watcher stops notifications and closes the channel.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FsWatcher {
    /// Start watching `root`; paths of modified files arrive on the receiver
    pub fn start(root: &Path) -> Result<(Self, mpsc::UnboundedReceiver<PathBuf>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_event(&event.kind) => {
                    for path in event.paths {
                        // Receiver gone means the pipeline stopped
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Watcher error"),
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        tracing::info!(root = %root.display(), "Watching for changes");
        Ok((
            Self {
                _watcher: watcher,
                root: root.to_path_buf(),
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Events that can change file content
fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
