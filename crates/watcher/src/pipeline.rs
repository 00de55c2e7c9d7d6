//! Event pipeline: notifier channel → debouncer → detector

use crate::debounce::Debouncer;
use crate::detector::{ChangeDetector, DetectOutcome};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Raw notifications received
    pub events: u64,
    /// Debounced paths handed to the detector
    pub processed: u64,
    pub recorded: u64,
    /// Detection passes that failed (VCS or ledger errors)
    pub failed: u64,
}

/// Feed notifier paths through the debouncer into `detector`
///
/// Runs until `shutdown` resolves or the channel closes. Paths still waiting
/// in the debouncer are processed before returning.
pub async fn run_pipeline<F>(
    mut events: mpsc::UnboundedReceiver<PathBuf>,
    detector: Arc<ChangeDetector>,
    debounce: Duration,
    shutdown: F,
) -> PipelineStats
where
    F: Future<Output = ()>,
{
    let mut debouncer = Debouncer::new(debounce);
    let mut stats = PipelineStats::default();
    tokio::pin!(shutdown);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("Pipeline shutting down");
                break;
            }
            event = events.recv() => match event {
                Some(path) => {
                    stats.events += 1;
                    debouncer.push(path, Instant::now());
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let ready = debouncer.drain_ready(Instant::now());
                process(&detector, ready, &mut stats).await;
            }
        }
    }

    process(&detector, debouncer.flush(), &mut stats).await;
    stats
}

async fn process(detector: &Arc<ChangeDetector>, paths: Vec<PathBuf>, stats: &mut PipelineStats) {
    for path in paths {
        stats.processed += 1;
        let detector = Arc::clone(detector);
        let shown = path.display().to_string();
        let result = tokio::task::spawn_blocking(move || detector.handle_event(&path)).await;

        match result {
            Ok(Ok(DetectOutcome::Recorded(_))) => stats.recorded += 1,
            Ok(Ok(outcome)) => debug!(path = %shown, ?outcome, "Event not recorded"),
            Ok(Err(e)) => {
                stats.failed += 1;
                warn!(path = %shown, error = %e, "Change detection failed");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(path = %shown, error = %e, "Detection task panicked");
            }
        }
    }
}
