//! Drop pending changes without committing

use crate::util;
use anyhow::Result;
use journal::ChangeLedger;
use owo_colors::OwoColorize;
use stake_core::{CacheLayer, Config, Layout};
use std::io::{self, BufRead, Write};

pub async fn run(yes: bool) -> Result<()> {
    let layout = Layout::discover(&util::current_dir()?)?;
    let config = Config::load(&layout.config_file())?;
    let ledger = ChangeLedger::open(&layout, &CacheLayer::system(&config.cache));

    let pending = ledger.pending_changes().len();
    if pending == 0 {
        println!("{}", "No pending changes".dimmed());
        return Ok(());
    }

    if !yes {
        print!("Drop {} pending changes? Files are not touched. [y/N] ", pending);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted");
            return Ok(());
        }
    }

    let dropped = ledger.reset_pending()?;
    println!("{} Dropped {} pending changes", "✓".green(), dropped);
    Ok(())
}
