//! TTL-bounded memoization
//!
//! Three value classes are cached by the tracker: per-file content hashes
//! (keyed), the VCS uncommitted-path view and the on-disk session state
//! (singletons). Eviction is lazy: an entry older than its TTL is recomputed
//! on the next read, or dropped by an explicit `invalidate`. There is no
//! background sweeper.

use crate::clock::{SharedClock, SystemClock};
use crate::config::CacheConfig;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Value classes held by the cache layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    /// Content fingerprint by path
    FileHash,
    /// VCS uncommitted-path list
    VcsStatus,
    /// Persisted session state snapshot
    SessionState,
}

impl CacheClass {
    pub fn label(self) -> &'static str {
        match self {
            CacheClass::FileHash => "file_hash",
            CacheClass::VcsStatus => "vcs_status",
            CacheClass::SessionState => "session_state",
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    recorded_at: Instant,
}

fn is_fresh(recorded_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(recorded_at) <= ttl
}

/// Keyed TTL cache
pub struct TtlCache<K, V> {
    class: CacheClass,
    ttl: Duration,
    clock: SharedClock,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(class: CacheClass, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            class,
            ttl,
            clock,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key`, computing it if absent or expired
    pub fn get_or_compute(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_compute(key, || Ok::<V, Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant: an `Err` from `compute` is returned and not cached
    pub fn get_or_try_compute<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let now = self.clock.now();
        let cached = self
            .entries
            .get(key)
            .filter(|entry| is_fresh(entry.recorded_at, now, self.ttl))
            .map(|entry| entry.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        tracing::trace!(cache = self.class.label(), "cache miss");
        let value = compute()?;
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value: value.clone(),
                recorded_at: self.clock.now(),
            },
        );
        Ok(value)
    }

    /// Peek at a fresh entry without computing
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| is_fresh(entry.recorded_at, now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Drop the entry for `key`
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Singleton TTL cache
pub struct TtlCell<V> {
    class: CacheClass,
    ttl: Duration,
    clock: SharedClock,
    slot: Mutex<Option<CacheEntry<V>>>,
}

impl<V: Clone> TtlCell<V> {
    pub fn new(class: CacheClass, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            class,
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get_or_compute(&self, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_compute(|| Ok::<V, Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant: an `Err` from `compute` is returned and not cached
    pub fn get_or_try_compute<E>(&self, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        tracing::trace!(cache = self.class.label(), "cache miss");
        let value = compute()?;
        *self.slot.lock() = Some(CacheEntry {
            value: value.clone(),
            recorded_at: self.clock.now(),
        });
        Ok(value)
    }

    /// Peek at the value if still fresh
    pub fn get(&self) -> Option<V> {
        let now = self.clock.now();
        self.slot
            .lock()
            .as_ref()
            .filter(|entry| is_fresh(entry.recorded_at, now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

/// Factory for the tracker's caches
///
/// Holds the configured TTL per value class and the clock every cache reads.
#[derive(Clone)]
pub struct CacheLayer {
    clock: SharedClock,
    file_hash_ttl: Duration,
    vcs_status_ttl: Duration,
    session_state_ttl: Duration,
}

impl CacheLayer {
    pub fn new(config: &CacheConfig, clock: SharedClock) -> Self {
        Self {
            clock,
            file_hash_ttl: Duration::from_secs(config.file_hash_ttl_secs),
            vcs_status_ttl: Duration::from_secs(config.vcs_status_ttl_secs),
            session_state_ttl: Duration::from_secs(config.session_state_ttl_secs),
        }
    }

    /// Cache layer on the real clock
    pub fn system(config: &CacheConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn ttl(&self, class: CacheClass) -> Duration {
        match class {
            CacheClass::FileHash => self.file_hash_ttl,
            CacheClass::VcsStatus => self.vcs_status_ttl,
            CacheClass::SessionState => self.session_state_ttl,
        }
    }

    pub fn clock(&self) -> SharedClock {
        Arc::clone(&self.clock)
    }

    pub fn keyed<K, V>(&self, class: CacheClass) -> TtlCache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        TtlCache::new(class, self.ttl(class), self.clock())
    }

    pub fn singleton<V: Clone>(&self, class: CacheClass) -> TtlCell<V> {
        TtlCell::new(class, self.ttl(class), self.clock())
    }
}
