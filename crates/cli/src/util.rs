//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use journal::ChangeLedger;
use stake_core::{telemetry, CacheLayer, Config, Layout, SharedTelemetry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vcs::{GitCli, VcsGateway};
use watcher::{ChangeDetector, IgnoreRules};

/// Canonical current directory
///
/// Watcher events carry canonical paths; the project root must match them.
pub fn current_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    cwd.canonicalize()
        .with_context(|| format!("Failed to resolve {}", cwd.display()))
}

/// Everything a command needs for an initialized project
pub struct Session {
    pub layout: Layout,
    pub config: Config,
    pub caches: CacheLayer,
    pub ledger: Arc<ChangeLedger>,
    pub vcs: Arc<VcsGateway>,
    pub telemetry: SharedTelemetry,
}

impl Session {
    /// Open the project containing the current directory
    pub fn open() -> Result<Self> {
        let layout = Layout::discover(&current_dir()?)?;
        Self::open_at(layout)
    }

    pub fn open_at(layout: Layout) -> Result<Self> {
        let config = Config::load(&layout.config_file())?;
        let caches = CacheLayer::system(&config.cache);
        let ledger = Arc::new(ChangeLedger::open(&layout, &caches));
        let backend = GitCli::open(layout.root())
            .with_context(|| format!("{} is not inside a git work tree", layout.root().display()))?;
        let vcs = Arc::new(VcsGateway::new(Arc::new(backend), &caches));
        let telemetry = telemetry::from_config(config.telemetry.sink, &layout);

        Ok(Self {
            layout,
            config,
            caches,
            ledger,
            vcs,
            telemetry,
        })
    }

    /// Detector with the project's ignore rules
    pub fn detector(&self) -> Result<ChangeDetector> {
        let rules = IgnoreRules::load(self.layout.root(), &self.config.watcher)?;
        Ok(ChangeDetector::new(
            self.layout.clone(),
            Arc::clone(&self.ledger),
            Arc::clone(&self.vcs),
            &self.caches,
            Arc::clone(&self.telemetry),
        )
        .with_ignore_rules(rules))
    }
}

/// Spinner on stderr; call `finish_and_clear` when done
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Relative time ("2 hours ago")
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    format_elapsed(Utc::now().signed_duration_since(ts))
}

fn format_elapsed(elapsed: chrono::Duration) -> String {
    let seconds = elapsed.num_seconds();
    if seconds < 0 {
        "in the future".to_string()
    } else if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Absolute local time ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// First line of a multi-line text, for one-line listings
pub fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(chrono::Duration::seconds(5)), "5 seconds ago");
        assert_eq!(format_elapsed(chrono::Duration::minutes(3)), "3 minutes ago");
        assert_eq!(format_elapsed(chrono::Duration::hours(2)), "2 hours ago");
        assert_eq!(format_elapsed(chrono::Duration::days(3)), "3 days ago");
        assert_eq!(format_elapsed(chrono::Duration::days(21)), "3 weeks ago");
        assert_eq!(format_elapsed(chrono::Duration::seconds(-10)), "in the future");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("\nTitle: Add parser\n\nBody"), "Title: Add parser");
        assert_eq!(first_line(""), "");
    }
}
