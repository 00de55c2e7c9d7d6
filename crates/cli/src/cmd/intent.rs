//! Show or set the session intent

use crate::util;
use anyhow::Result;
use journal::ChangeLedger;
use owo_colors::OwoColorize;
use stake_core::{CacheLayer, Config, Layout};

pub async fn run(text: Option<String>, clear: bool) -> Result<()> {
    let layout = Layout::discover(&util::current_dir()?)?;
    let config = Config::load(&layout.config_file())?;
    let ledger = ChangeLedger::open(&layout, &CacheLayer::system(&config.cache));

    if clear {
        ledger.set_intent(None)?;
        println!("{} Intent cleared", "✓".green());
        return Ok(());
    }

    match text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(intent) => {
            ledger.set_intent(Some(intent.clone()))?;
            println!("{} Intent: {}", "✓".green(), intent.cyan());
        }
        None => match ledger.intent() {
            Some(intent) => println!("{}", intent),
            None => println!("{}", "No intent set".dimmed()),
        },
    }
    Ok(())
}
