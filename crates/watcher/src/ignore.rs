//! Ignore rules for watcher events
//!
//! Sources, checked in order:
//! 1. Built-in patterns (`.stake/`, `.git/`, editor temp files; always active)
//! 2. Additional patterns from `[watcher] additional_patterns`
//! 3. `.gitignore` at the project root (when `use_gitignore` is set)
//!
//! Paths are repo-relative, `/`-separated.

use anyhow::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use stake_core::config::WatcherConfig;
use stake_core::layout::STAKE_DIR;
use std::path::{Path, PathBuf};

/// Directories never tracked, at any depth
const BUILTIN_DIRS: &[&str] = &[STAKE_DIR, ".git", ".jj", ".hg"];

pub struct IgnoreRules {
    root: PathBuf,
    gitignore: Option<Gitignore>,
    additional: Option<Gitignore>,
    use_gitignore: bool,
}

impl IgnoreRules {
    /// Build rules for the project at `root`
    pub fn load(root: &Path, config: &WatcherConfig) -> Result<Self> {
        let additional = if config.additional_patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new(root);
            for pattern in &config.additional_patterns {
                builder.add_line(None, pattern)?;
            }
            Some(builder.build()?)
        };

        let mut rules = Self {
            root: root.to_path_buf(),
            gitignore: None,
            additional,
            use_gitignore: config.use_gitignore,
        };
        rules.reload_gitignore()?;
        Ok(rules)
    }

    /// Re-read `.gitignore` from disk
    pub fn reload_gitignore(&mut self) -> Result<()> {
        let path = self.root.join(".gitignore");
        self.gitignore = if self.use_gitignore && path.exists() {
            let mut builder = GitignoreBuilder::new(&self.root);
            if let Some(e) = builder.add(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Partially invalid .gitignore");
            }
            Some(builder.build()?)
        } else {
            None
        };
        Ok(())
    }

    /// Whether events for the repo-relative `path` should be dropped
    pub fn should_ignore(&self, path: &str) -> bool {
        if is_builtin_ignored(path) {
            return true;
        }

        let is_dir = self.root.join(path).is_dir();
        let candidate = Path::new(path);
        for matcher in [&self.additional, &self.gitignore].into_iter().flatten() {
            if matcher
                .matched_path_or_any_parents(candidate, is_dir)
                .is_ignore()
            {
                return true;
            }
        }
        false
    }

    /// Number of active sources, built-in included
    pub fn active_sources(&self) -> usize {
        1 + usize::from(self.gitignore.is_some()) + usize::from(self.additional.is_some())
    }
}

fn is_builtin_ignored(path: &str) -> bool {
    let mut components = path.split('/');
    let file_name = components.next_back().unwrap_or_default();
    components.any(|dir| BUILTIN_DIRS.contains(&dir))
        || BUILTIN_DIRS.contains(&file_name)
        || is_editor_temp(file_name)
}

/// Swap, backup and lock files editors write next to the real file
fn is_editor_temp(file_name: &str) -> bool {
    file_name.ends_with(".swp")
        || file_name.ends_with(".swo")
        || file_name.ends_with(".swx")
        || file_name.ends_with('~')
        || file_name.starts_with(".#")
        || (file_name.starts_with('#') && file_name.ends_with('#'))
        || file_name == ".DS_Store"
        || file_name == "4913"
}
