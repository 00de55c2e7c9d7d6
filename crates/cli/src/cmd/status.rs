//! Show session status

use crate::util::{self, Session};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::sync::Arc;

const SHOWN: usize = 20;

pub async fn run() -> Result<()> {
    let session = Session::open()?;
    let state = session.ledger.state();

    let vcs = Arc::clone(&session.vcs);
    let uncommitted = tokio::task::spawn_blocking(move || vcs.uncommitted_paths()).await?;

    println!("{}", "Session Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Repository:    {}", session.layout.root().display().to_string().cyan());
    match &state.intent {
        Some(intent) => println!("Intent:        {}", intent),
        None => println!("Intent:        {}", "not set".dimmed()),
    }
    println!();

    println!("Pending changes: {}", state.pending_changes.len());
    for change in state.pending_changes.iter().take(SHOWN) {
        println!(
            "  {} {}",
            change.summary,
            util::format_relative_time(change.observed_at).dimmed()
        );
    }
    if state.pending_changes.len() > SHOWN {
        println!("  ... and {} more", state.pending_changes.len() - SHOWN);
    }
    println!();

    match uncommitted {
        Ok(paths) => {
            let untracked_by_ledger = paths
                .iter()
                .filter(|p| !session.layout.is_bookkeeping(p) && !state.is_pending(p))
                .count();
            println!("Uncommitted in git: {}", paths.len());
            if untracked_by_ledger > 0 {
                println!(
                    "  {}",
                    format!(
                        "{} not recorded yet; run 'stake scan' to pick them up",
                        untracked_by_ledger
                    )
                    .dimmed()
                );
            }
        }
        Err(e) => println!("Uncommitted in git: {} ({})", "unknown".red(), e),
    }
    println!();

    println!("Last stake:");
    match state.last_stake() {
        Some(stake) => {
            println!("  Name:        {}", stake.name.cyan());
            println!(
                "  Time:        {} ({})",
                util::format_relative_time(stake.created_at),
                util::format_absolute_time(stake.created_at).dimmed()
            );
            println!("  Files:       {}", stake.changes.len());
            if let Some(commit) = &stake.commit_id {
                println!("  Commit:      {}", commit.yellow());
            }
        }
        None => println!("  {}", "No stakes yet".dimmed()),
    }
    println!("Stakes total:  {}", state.stakes.len());

    Ok(())
}
