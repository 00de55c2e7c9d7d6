//! Show summaries of past stakes

use crate::util;
use anyhow::{Context, Result};
use journal::SemanticHistory;
use owo_colors::OwoColorize;
use stake_core::Layout;

pub async fn run(limit: usize) -> Result<()> {
    let layout = Layout::discover(&util::current_dir()?)?;
    let history = SemanticHistory::open(&layout.history_dir())
        .context("Failed to open semantic history")?;

    let records = history.newest_first(limit)?;
    if records.is_empty() {
        println!("{}", "No stakes recorded yet".dimmed());
        return Ok(());
    }

    println!("{} ({} total)", "Stake History".bold(), history.count());
    println!();
    for record in records {
        println!(
            "{} {} {}",
            record.commit_id.get(..10).unwrap_or(&record.commit_id).yellow(),
            util::format_relative_time(record.recorded_at).dimmed(),
            format!("{} files", record.changes.len()).cyan()
        );
        for line in record.summary.lines().filter(|l| !l.trim().is_empty()) {
            println!("    {}", line);
        }
        if let Some(intent) = &record.intent {
            println!("    {} {}", "intent:".dimmed(), intent.dimmed());
        }
        if !record.provider.is_empty() {
            println!(
                "    {}",
                format!("via {} {}", record.provider, record.model).dimmed()
            );
        }
        println!();
    }
    Ok(())
}
