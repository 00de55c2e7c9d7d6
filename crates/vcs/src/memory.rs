//! In-process backend
//!
//! Models a working tree as an ordered list of dirty paths. Commit ids are
//! `c1`, `c2`, ... Each operation can be made to fail on demand.

use crate::backend::{UncommittedPaths, VcsBackend, VcsError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Inner {
    dirty: UncommittedPaths,
    staged: bool,
    commits: Vec<(String, String)>,
    fail_status: Option<String>,
    fail_stage: Option<String>,
    fail_commit: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryVcs {
    inner: Mutex<Inner>,
    status_calls: AtomicUsize,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dirty<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vcs = Self::new();
        vcs.inner.lock().dirty = paths.into_iter().collect();
        vcs
    }

    /// Mark `path` as modified in the working tree
    pub fn touch(&self, path: impl Into<String>) {
        self.inner.lock().dirty.insert(path);
    }

    pub fn fail_status(&self, reason: Option<&str>) {
        self.inner.lock().fail_status = reason.map(str::to_string);
    }

    pub fn fail_stage(&self, reason: Option<&str>) {
        self.inner.lock().fail_stage = reason.map(str::to_string);
    }

    pub fn fail_commit(&self, reason: Option<&str>) {
        self.inner.lock().fail_commit = reason.map(str::to_string);
    }

    /// `(commit id, message)` pairs, oldest first
    pub fn commits(&self) -> Vec<(String, String)> {
        self.inner.lock().commits.clone()
    }

    pub fn is_staged(&self) -> bool {
        self.inner.lock().staged
    }

    /// Number of `list_uncommitted` calls served so far
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

impl VcsBackend for MemoryVcs {
    fn list_uncommitted(&self) -> Result<Vec<String>, VcsError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock();
        if let Some(reason) = &inner.fail_status {
            return Err(VcsError::Injected(reason.clone()));
        }
        Ok(inner.dirty.as_slice().to_vec())
    }

    fn stage_all(&self) -> Result<(), VcsError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.fail_stage {
            return Err(VcsError::Injected(reason.clone()));
        }
        inner.staged = true;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String, VcsError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.fail_commit {
            return Err(VcsError::Injected(reason.clone()));
        }
        if !inner.staged || inner.dirty.is_empty() {
            return Err(VcsError::NothingToCommit);
        }

        let id = format!("c{}", inner.commits.len() + 1);
        inner.commits.push((id.clone(), message.to_string()));
        inner.dirty = UncommittedPaths::new();
        inner.staged = false;
        Ok(id)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_requires_staging() {
        let vcs = MemoryVcs::with_dirty(["a.py"]);
        assert!(matches!(vcs.commit("m"), Err(VcsError::NothingToCommit)));

        vcs.stage_all().unwrap();
        assert_eq!(vcs.commit("m").unwrap(), "c1");
        assert!(vcs.list_uncommitted().unwrap().is_empty());
        assert_eq!(vcs.commits(), vec![("c1".to_string(), "m".to_string())]);
    }

    #[test]
    fn test_injected_failures() {
        let vcs = MemoryVcs::with_dirty(["a.py"]);
        vcs.fail_status(Some("index locked"));
        assert!(matches!(vcs.list_uncommitted(), Err(VcsError::Injected(_))));

        vcs.fail_status(None);
        assert_eq!(vcs.list_uncommitted().unwrap(), vec!["a.py"]);
        assert_eq!(vcs.status_calls(), 2);
    }
}
