//! Record every uncommitted file that has no pending change

use crate::util::{self, Session};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run() -> Result<()> {
    let session = Session::open()?;
    let detector = Arc::new(session.detector()?);

    let pb = util::spinner("Scanning uncommitted files...");
    let result = tokio::task::spawn_blocking(move || detector.scan_all_uncommitted()).await?;
    pb.finish_and_clear();

    let added = result?;
    if added == 0 {
        println!("{}", "No new changes".dimmed());
    } else {
        println!("{} Recorded {} new changes", "✓".green(), added);
    }
    Ok(())
}
