//! Bookkeeping directory layout and path helpers

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Name of the bookkeeping directory at the project root
pub const STAKE_DIR: &str = ".stake";

/// Paths inside a project's bookkeeping directory
///
/// ```text
/// .stake/
///   .gitignore        hides the directory from git
///   state.json        session ledger
///   config.toml       project configuration
///   history/          semantic history (sled)
///   telemetry.jsonl   telemetry events
///   logs/
///     watch.log
///   locks/
///     watch.lock
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    stake_dir: PathBuf,
}

impl Layout {
    /// Layout for a project root (nothing is created)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let stake_dir = root.join(STAKE_DIR);
        Self { root, stake_dir }
    }

    /// Create the bookkeeping directory tree
    ///
    /// Returns `true` if the directory did not exist before.
    pub fn bootstrap(&self) -> Result<bool> {
        let created = !self.stake_dir.is_dir();
        for dir in [&self.stake_dir, &self.logs_dir(), &self.locks_dir()] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        // Keep bookkeeping files out of the VCS view
        let ignore_file = self.stake_dir.join(".gitignore");
        if !ignore_file.exists() {
            std::fs::write(&ignore_file, "*\n")
                .with_context(|| format!("Failed to write {}", ignore_file.display()))?;
        }
        Ok(created)
    }

    /// Find the project root by walking up from `start` to a `.stake/` directory
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(STAKE_DIR).is_dir() {
                return Ok(Self::new(current));
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => anyhow::bail!("Not a stake project (no {} directory found)", STAKE_DIR),
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.stake_dir.is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stake_dir(&self) -> &Path {
        &self.stake_dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.stake_dir.join("state.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.stake_dir.join("config.toml")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.stake_dir.join("history")
    }

    pub fn telemetry_file(&self) -> PathBuf {
        self.stake_dir.join("telemetry.jsonl")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.stake_dir.join("logs")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.stake_dir.join("locks")
    }

    /// Normalize `path` to a repo-relative, `/`-separated string
    ///
    /// Accepts absolute paths under the root or relative paths. Returns `None`
    /// for paths outside the root or containing `..`.
    pub fn relativize(&self, path: &Path) -> Option<String> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };
        normalize_path(relative)
    }

    /// Whether a repo-relative path lies in the bookkeeping directory
    pub fn is_bookkeeping(&self, relative: &str) -> bool {
        relative == STAKE_DIR || relative.starts_with(&format!("{}/", STAKE_DIR))
    }
}

/// Normalize a relative path for storage
///
/// - Converts to `/` separators
/// - Removes `./` components
/// - Rejects `..`, absolute paths and the empty path
pub fn normalize_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Atomic write helper
///
/// Writes to a temporary file in the target's directory, fsyncs it, then
/// renames it over the target. Readers see either the old or the new file.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .with_context(|| format!("No parent directory for {}", target.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .with_context(|| format!("Failed to replace {}", target.display()))?;
    Ok(())
}
