//! Periodic reconciliation
//!
//! Runs `scan_all_uncommitted` on an interval to pick up changes the
//! notifier missed (queue overflow, edits made while nothing was watching).

use crate::detector::ChangeDetector;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct PeriodicReconciler {
    detector: Arc<ChangeDetector>,
    /// Scan interval (default: 5 minutes)
    interval: Duration,
}

impl PeriodicReconciler {
    pub fn new(detector: Arc<ChangeDetector>, interval: Duration) -> Self {
        Self { detector, interval }
    }

    /// Run one scan on the blocking pool; returns the number of changes added
    pub async fn reconcile_once(&self) -> Result<usize> {
        let detector = Arc::clone(&self.detector);
        let added = tokio::task::spawn_blocking(move || detector.scan_all_uncommitted()).await??;
        Ok(added)
    }

    /// Scan forever; failures are logged and the next tick retries
    ///
    /// The first scan runs immediately.
    pub async fn run(self) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.interval, "Starting periodic reconciliation");

        loop {
            timer.tick().await;

            match self.reconcile_once().await {
                Ok(0) => debug!("Periodic reconciliation: nothing missed"),
                Ok(added) => info!(added, "Periodic reconciliation recorded missed changes"),
                Err(e) => warn!(error = %e, "Periodic reconciliation failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal::ChangeLedger;
    use stake_core::config::CacheConfig;
    use stake_core::telemetry::NoopTelemetry;
    use stake_core::{CacheLayer, Layout};
    use tempfile::TempDir;
    use vcs::{MemoryVcs, VcsGateway};

    fn detector(dir: &TempDir, vcs: Arc<MemoryVcs>) -> Arc<ChangeDetector> {
        let layout = Layout::new(dir.path());
        let caches = CacheLayer::system(&CacheConfig::default());
        let ledger = Arc::new(ChangeLedger::init(&layout, &caches, None).unwrap());
        let gateway = Arc::new(VcsGateway::new(vcs, &caches));
        Arc::new(ChangeDetector::new(
            layout,
            ledger,
            gateway,
            &caches,
            Arc::new(NoopTelemetry),
        ))
    }

    #[tokio::test]
    async fn test_reconciliation_finds_missed_changes() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = Arc::new(MemoryVcs::new());
        let detector = detector(&temp_dir, vcs.clone());
        let reconciler = PeriodicReconciler::new(detector.clone(), Duration::from_millis(50));
        let task = tokio::spawn(reconciler.run());

        // Edit made without any notifier event
        std::fs::write(temp_dir.path().join("missed.py"), "x = 1\n").unwrap();
        vcs.touch("missed.py");

        let found = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if !detector.ledger().pending_changes().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        task.abort();

        assert!(found.is_ok());
        assert_eq!(detector.ledger().pending_changes()[0].path, "missed.py");
    }

    #[tokio::test]
    async fn test_failed_scan_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let reconciler =
            PeriodicReconciler::new(detector(&temp_dir, vcs.clone()), Duration::from_secs(300));

        vcs.fail_status(Some("boom"));
        assert!(reconciler.reconcile_once().await.is_err());

        vcs.fail_status(None);
        std::fs::write(temp_dir.path().join("a.py"), "a").unwrap();
        assert_eq!(reconciler.reconcile_once().await.unwrap(), 1);
    }
}
