//! Backend trait and shared types

use ahash::AHashSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Not a repository: {0}")]
    NotARepository(PathBuf),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {detail}")]
    Parse { command: String, detail: String },

    #[error("Nothing to commit")]
    NothingToCommit,

    /// Failure injected by an in-memory backend
    #[error("{0}")]
    Injected(String),
}

/// Version-control operations the tracker needs
///
/// Implementations are synchronous; async callers go through
/// `spawn_blocking`.
pub trait VcsBackend: Send + Sync {
    /// Staged, unstaged and untracked paths, repo-relative with `/` separators
    fn list_uncommitted(&self) -> Result<Vec<String>, VcsError>;

    fn stage_all(&self) -> Result<(), VcsError>;

    /// Commit the staged tree; returns the new commit id
    fn commit(&self, message: &str) -> Result<String, VcsError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Deduplicated path list that keeps first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncommittedPaths {
    ordered: Vec<String>,
    members: AHashSet<String>,
}

impl UncommittedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path`; returns false if it was already present
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.members.contains(&path) {
            return false;
        }
        self.members.insert(path.clone());
        self.ordered.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for UncommittedPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut paths = Self::new();
        for path in iter {
            paths.insert(path);
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order_without_duplicates() {
        let paths: UncommittedPaths = ["b.py", "a.py", "b.py", "c.py", "a.py"]
            .into_iter()
            .collect();

        assert_eq!(paths.as_slice(), &["b.py", "a.py", "c.py"]);
        assert!(paths.contains("c.py"));
        assert!(!paths.contains("d.py"));
    }
}
