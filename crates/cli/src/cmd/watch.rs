//! Foreground watch loop
//!
//! notifier → debounce → detector, with periodic reconciliation beside it.
//! Runs until Ctrl-C; pending debounced paths are processed before exit.

use crate::locks::WatchLock;
use crate::logging;
use crate::util::{self, Session};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use stake_core::Layout;
use std::sync::Arc;
use std::time::Duration;
use watcher::{run_pipeline, FsWatcher, PeriodicReconciler};

pub async fn run(verbose: u8) -> Result<()> {
    let layout = Layout::discover(&util::current_dir()?)?;
    let _log_guard = logging::init_with_file(verbose, &layout.logs_dir(), "watch.log");
    let _lock = WatchLock::acquire(&layout.locks_dir())?;

    let session = Session::open_at(layout)?;
    let detector = Arc::new(session.detector()?);
    let watcher_config = session.config.watcher.clone();

    let (fs_watcher, events) = FsWatcher::start(session.layout.root())?;

    let reconciler = if watcher_config.reconcile_interval_secs > 0 {
        let reconciler = PeriodicReconciler::new(
            Arc::clone(&detector),
            Duration::from_secs(watcher_config.reconcile_interval_secs),
        );
        Some(tokio::spawn(reconciler.run()))
    } else {
        // Without periodic scans, catch up on edits made while not watching
        let detector = Arc::clone(&detector);
        let added = tokio::task::spawn_blocking(move || detector.scan_all_uncommitted())
            .await?
            .context("Initial scan failed")?;
        tracing::info!(added, "Initial scan complete");
        None
    };

    println!(
        "{} Watching {} {}",
        "●".green(),
        fs_watcher.root().display().to_string().cyan(),
        "(Ctrl-C to stop)".dimmed()
    );
    if let Some(intent) = session.ledger.intent() {
        println!("  Intent: {}", intent);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let stats = run_pipeline(
        events,
        detector,
        Duration::from_millis(watcher_config.debounce_ms),
        shutdown,
    )
    .await;

    if let Some(task) = reconciler {
        task.abort();
    }
    drop(fs_watcher);

    tracing::info!(?stats, "Watch stopped");
    println!();
    println!(
        "Stopped. {} events, {} recorded, {} failed",
        stats.events,
        stats.recorded.to_string().green(),
        stats.failed
    );
    println!("Pending changes: {}", session.ledger.pending_changes().len());
    Ok(())
}
