//! Commit pending changes as a named stake

use crate::util::{self, Session};
use anyhow::{Context, Result};
use journal::SemanticHistory;
use owo_colors::OwoColorize;
use stake::{AbortReason, StakeCoordinator, StakeOptions, StakeOutcome};
use std::sync::Arc;
use summarize::{build_summarizer, OfflineSummarizer, SharedSummarizer};

pub async fn run(name: &str, message: &str) -> Result<()> {
    let session = Session::open()?;
    let detector = Arc::new(session.detector()?);

    let summarizer: SharedSummarizer = match build_summarizer(&session.config.summarizer) {
        Ok(summarizer) => summarizer,
        Err(e) => {
            tracing::warn!(error = %e, "Summarizer unavailable, using offline summary");
            eprintln!("{} {}; using offline summary", "Warning:".yellow(), e);
            Arc::new(OfflineSummarizer::new(session.config.summarizer.max_files))
        }
    };

    let history = SemanticHistory::open(&session.layout.history_dir())
        .context("Failed to open semantic history")?;
    let coordinator = StakeCoordinator::new(
        detector,
        Arc::clone(&session.vcs),
        summarizer,
        Arc::clone(&session.telemetry),
        StakeOptions::from_config(&session.config),
    )
    .with_history(Arc::new(history));

    let pb = util::spinner(format!("Creating stake '{}'...", name));
    let outcome = coordinator.create_stake(name, message).await;
    coordinator.flush_history().await;
    pb.finish_and_clear();

    match outcome? {
        StakeOutcome::Committed(report) => {
            println!(
                "{} Stake {} created ({} files)",
                "✓".green(),
                report.stake.name.cyan(),
                report.stake.changes.len()
            );
            println!("  Commit:  {}", short_commit(&report.commit_id).yellow());
            println!("  Summary: {}", util::first_line(&report.summary));
            if report.summary_fallback {
                println!(
                    "{}",
                    "Note: the summarizer did not respond; a placeholder was committed".dimmed()
                );
            }
            if !report.ledger_recorded {
                println!(
                    "{}",
                    "Warning: the commit exists but .stake/state.json was not updated; see 'stake reset'".yellow()
                );
            }
            Ok(())
        }
        StakeOutcome::Aborted(AbortReason::NothingToStake) => {
            println!("{}", "Nothing to stake: no pending changes".yellow());
            Ok(())
        }
        StakeOutcome::Aborted(reason) => {
            anyhow::bail!("Stake '{}' was not created: {}. Pending changes are kept.", name, reason)
        }
    }
}

fn short_commit(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}
