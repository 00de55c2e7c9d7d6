//! Cached façade over a VCS backend
//!
//! The gateway owns the VCS-status cache and is the only component that
//! invalidates it. Readers may see a path list up to one TTL old.

use crate::backend::{UncommittedPaths, VcsBackend, VcsError};
use stake_core::cache::CacheClass;
use stake_core::{CacheLayer, TtlCell};
use std::sync::Arc;

pub struct VcsGateway {
    backend: Arc<dyn VcsBackend>,
    status: TtlCell<Arc<UncommittedPaths>>,
}

impl VcsGateway {
    pub fn new(backend: Arc<dyn VcsBackend>, caches: &CacheLayer) -> Self {
        Self {
            backend,
            status: caches.singleton(CacheClass::VcsStatus),
        }
    }

    pub fn backend(&self) -> &Arc<dyn VcsBackend> {
        &self.backend
    }

    /// Uncommitted paths, served from cache while fresh
    pub fn uncommitted_paths(&self) -> Result<Arc<UncommittedPaths>, VcsError> {
        self.status.get_or_try_compute(|| {
            let listed = self.backend.list_uncommitted()?;
            Ok(Arc::new(listed.into_iter().collect()))
        })
    }

    /// Uncommitted paths read straight from the backend
    pub fn fresh_uncommitted_paths(&self) -> Result<Arc<UncommittedPaths>, VcsError> {
        self.status.invalidate();
        self.uncommitted_paths()
    }

    pub fn stage_all(&self) -> Result<(), VcsError> {
        let result = self.backend.stage_all();
        self.status.invalidate();
        result
    }

    /// Commit with `title`, then a blank line and `description` when present
    pub fn commit(&self, title: &str, description: &str) -> Result<String, VcsError> {
        let message = if description.trim().is_empty() {
            title.to_string()
        } else {
            format!("{}\n\n{}", title, description)
        };

        let id = self.backend.commit(&message)?;
        self.status.invalidate();
        tracing::info!(backend = self.backend.name(), commit = %id, "Committed");
        Ok(id)
    }

    /// Drop the cached path list
    pub fn invalidate_status(&self) {
        self.status.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryVcs;
    use stake_core::config::CacheConfig;
    use stake_core::ManualClock;
    use std::time::Duration;

    fn gateway(vcs: Arc<MemoryVcs>) -> (VcsGateway, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let caches = CacheLayer::new(&CacheConfig::default(), clock.clone());
        (VcsGateway::new(vcs, &caches), clock)
    }

    #[test]
    fn test_status_cached_within_ttl() {
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let (gateway, clock) = gateway(vcs.clone());

        assert!(gateway.uncommitted_paths().unwrap().contains("a.py"));
        vcs.touch("b.py");
        clock.advance(Duration::from_secs(9));
        assert!(!gateway.uncommitted_paths().unwrap().contains("b.py"));
        assert_eq!(vcs.status_calls(), 1);

        clock.advance(Duration::from_secs(2));
        assert!(gateway.uncommitted_paths().unwrap().contains("b.py"));
        assert_eq!(vcs.status_calls(), 2);
    }

    #[test]
    fn test_fresh_bypasses_cache() {
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let (gateway, _clock) = gateway(vcs.clone());

        gateway.uncommitted_paths().unwrap();
        vcs.touch("b.py");
        assert!(gateway.fresh_uncommitted_paths().unwrap().contains("b.py"));
    }

    #[test]
    fn test_failed_status_is_not_cached() {
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let (gateway, _clock) = gateway(vcs.clone());

        vcs.fail_status(Some("boom"));
        assert!(gateway.uncommitted_paths().is_err());
        vcs.fail_status(None);
        assert!(gateway.uncommitted_paths().unwrap().contains("a.py"));
    }

    #[test]
    fn test_commit_joins_message_and_invalidates() {
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let (gateway, _clock) = gateway(vcs.clone());

        assert_eq!(gateway.uncommitted_paths().unwrap().len(), 1);
        gateway.stage_all().unwrap();
        let id = gateway.commit("Stake: n1", "did things").unwrap();

        assert_eq!(id, "c1");
        assert_eq!(vcs.commits()[0].1, "Stake: n1\n\ndid things");
        assert!(gateway.uncommitted_paths().unwrap().is_empty());
    }

    #[test]
    fn test_commit_failure_is_a_value() {
        let vcs = Arc::new(MemoryVcs::with_dirty(["a.py"]));
        let (gateway, _clock) = gateway(vcs.clone());
        vcs.fail_commit(Some("hook rejected"));

        gateway.stage_all().unwrap();
        assert!(matches!(
            gateway.commit("Stake: n1", ""),
            Err(VcsError::Injected(_))
        ));
    }
}
