//! Commit message formatting for stakes

use journal::Change;
use stake_core::config::StakeConfig;

/// Marker that opens the placeholder used when no summary could be produced
pub const FALLBACK_MARKER: &str = "[summary unavailable]";

/// Options for commit message formatting
#[derive(Debug, Clone)]
pub struct CommitMessageOptions {
    /// Prepended to the stake name to form the commit title
    pub title_prefix: String,

    /// Append the list of staked files to the description
    pub include_files: bool,

    /// Maximum number of files to list (rest shown as "... and N more")
    pub max_files_shown: usize,
}

impl Default for CommitMessageOptions {
    fn default() -> Self {
        Self {
            title_prefix: "Stake: ".to_string(),
            include_files: false,
            max_files_shown: 10,
        }
    }
}

impl CommitMessageOptions {
    pub fn from_config(config: &StakeConfig) -> Self {
        Self {
            title_prefix: config.title_prefix.clone(),
            include_files: config.include_files,
            max_files_shown: config.max_files_shown,
        }
    }

    pub fn title(&self, name: &str) -> String {
        format!("{}{}", self.title_prefix, name)
    }

    /// The user's message, a blank line, then the summary
    pub fn description(&self, message: &str, summary: &str, changes: &[Change]) -> String {
        let mut description = format!("{}\n\n{}", message.trim_end(), summary.trim_end());

        if self.include_files && !changes.is_empty() {
            description.push_str("\n\nFiles changed:\n");
            let shown = self.max_files_shown.min(changes.len());
            for change in &changes[..shown] {
                description.push_str(&format!("  - {}\n", change.path));
            }
            if changes.len() > shown {
                description.push_str(&format!("  ... and {} more\n", changes.len() - shown));
            }
        }
        description
    }
}

/// Placeholder summary naming why the summarizer gave nothing
pub fn fallback_summary(reason: &dyn std::fmt::Display) -> String {
    format!("{} {}", FALLBACK_MARKER, reason)
}
