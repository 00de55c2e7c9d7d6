//! Configuration management command
//!
//! Reads and writes `.stake/config.toml` of the current project.

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use stake_core::config::example_config;
use stake_core::{Config, Layout};

fn project() -> Result<Layout> {
    Layout::discover(&util::current_dir()?)
}

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let layout = project()?;
    let path = layout.config_file();
    let config = Config::load(&path)?;

    println!("{}", "Project Configuration".bold());
    let note = if path.exists() { "" } else { " (not created, showing defaults)" };
    println!("{}: {}{}\n", "Location".dimmed(), path.display().dimmed(), note.dimmed());

    let root = toml::Value::try_from(&config).context("Failed to serialize config")?;
    let Some(sections) = root.as_table() else {
        return Ok(());
    };
    for (section, values) in sections {
        println!("{}", format!("[{}]", section).yellow());
        if let Some(values) = values.as_table() {
            for (key, value) in values {
                println!("  {} = {}", key.cyan(), value);
            }
        }
        println!();
    }

    println!("{}", "Valid Ranges:".bold());
    println!("  cache.*_ttl_secs: 0-3600 (file_hash_ttl_secs: 0-86400)");
    println!("  stake.summary_timeout_secs: 1-600, stake.max_files_shown: 1-200");
    println!("  summarizer.max_files: 1-200, summarizer.temperature: 0.0-2.0");
    println!("  watcher.debounce_ms: 0-10000");
    println!("  watcher.reconcile_interval_secs: 0 (off) or 10-86400");
    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = Config::load(&project()?.config_file())?;
    let value = config
        .get_key(key)
        .context("Use 'stake config list' to see available keys")?;
    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let path = project()?.config_file();
    let mut config = Config::load(&path)?;

    config.set_key(key, value).context("Invalid configuration value")?;
    config.save(&path)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: restart 'stake watch' for watcher settings to take effect".yellow()
    );
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let path = project()?.config_file();

    if create && !path.exists() {
        Config::default().save(&path)?;
        println!("{} Created config file at: {}", "✓".green(), path.display());
    } else {
        println!("{}", path.display());
        if !path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }
    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", example_config());
    Ok(())
}
