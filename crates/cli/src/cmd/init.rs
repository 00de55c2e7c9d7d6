//! Initialize stake tracking in a repository

use crate::util;
use anyhow::{Context, Result};
use journal::ChangeLedger;
use owo_colors::OwoColorize;
use stake_core::{CacheLayer, Config, Layout};
use vcs::GitCli;

pub async fn run(intent: Option<String>) -> Result<()> {
    let root = util::current_dir()?;
    GitCli::open(&root).context("stake needs a git work tree; run 'git init' first")?;

    let layout = Layout::new(&root);
    let existed = layout.is_initialized();
    let caches = CacheLayer::system(&Config::default().cache);
    let ledger = ChangeLedger::init(&layout, &caches, intent)?;

    if existed {
        println!("{} Already tracking {}", "✓".green(), root.display());
    } else {
        println!("{} Initialized stake in {}", "✓".green(), root.display());
        println!();
        println!("Created {}/", layout.stake_dir().display());
        println!("  - state.json   (pending changes and stakes)");
        println!("  - logs/        (watch logs)");
        println!("  - locks/       (single-watcher lock)");
    }

    match ledger.intent() {
        Some(intent) => println!("Intent: {}", intent.cyan()),
        None => println!("{}", "Tip: set what you are building with 'stake intent <text>'".dimmed()),
    }
    println!();
    println!("Next steps:");
    println!("  - Run 'stake watch' to record changes as you work");
    println!("  - Run 'stake stake <name> <message>' to checkpoint them");
    Ok(())
}
