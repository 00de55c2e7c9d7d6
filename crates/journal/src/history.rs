//! Append-only semantic history using sled
//!
//! Every committed stake leaves one record: the commit it produced, the
//! summary text, the changes it bundled and the intent at the time.

use crate::model::Change;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use ulid::Ulid;

/// One entry of semantic history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Ulid,
    pub recorded_at: DateTime<Utc>,
    pub commit_id: String,
    pub summary: String,
    pub changes: Vec<Change>,
    pub intent: Option<String>,
    /// Summarizer backend that produced `summary`
    pub provider: String,
    pub model: String,
}

impl HistoryRecord {
    pub fn new(
        commit_id: impl Into<String>,
        summary: impl Into<String>,
        changes: Vec<Change>,
        intent: Option<String>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            recorded_at: Utc::now(),
            commit_id: commit_id.into(),
            summary: summary.into(),
            changes,
            intent,
            provider: String::new(),
            model: String::new(),
        }
    }

    pub fn with_source(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to encode history record")
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to decode history record")
    }
}

/// Durable destination for history records
pub trait HistorySink: Send + Sync {
    fn append(&self, record: &HistoryRecord) -> Result<()>;
}

/// sled-backed history store
pub struct SemanticHistory {
    /// Sled database
    db: Db,
    /// In-memory index: record id -> sequence number
    index: RwLock<BTreeMap<Ulid, u64>>,
    /// Monotonic sequence counter
    seq_counter: AtomicU64,
}

impl SemanticHistory {
    /// Open or create the history database in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let db = sled::open(dir)
            .with_context(|| format!("Failed to open history at {}", dir.display()))?;

        let mut index = BTreeMap::new();
        let mut max_seq = 0u64;

        for item in db.iter() {
            let (key, value) = item?;
            let seq = u64::from_be_bytes(key.as_ref().try_into()?);
            match HistoryRecord::deserialize(&value) {
                Ok(record) => {
                    index.insert(record.id, seq);
                }
                Err(e) => tracing::warn!(seq, error = %e, "Skipping unreadable history record"),
            }
            max_seq = max_seq.max(seq);
        }

        Ok(Self {
            db,
            index: RwLock::new(index),
            seq_counter: AtomicU64::new(max_seq + 1),
        })
    }

    /// Append a record; returns its sequence number
    pub fn append_record(&self, record: &HistoryRecord) -> Result<u64> {
        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);
        self.db.insert(seq.to_be_bytes(), record.serialize()?)?;
        self.index.write().insert(record.id, seq);

        // Flush to ensure durability
        self.db.flush()?;
        Ok(seq)
    }

    pub fn get(&self, id: &Ulid) -> Result<Option<HistoryRecord>> {
        let seq = match self.index.read().get(id) {
            Some(&seq) => seq,
            None => return Ok(None),
        };
        self.read_seq(seq)
    }

    pub fn latest(&self) -> Result<Option<HistoryRecord>> {
        match self.db.last()? {
            Some((_, value)) => Ok(Some(HistoryRecord::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` records, newest first
    pub fn newest_first(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let mut records = Vec::new();
        for item in self.db.iter().rev().take(limit) {
            let (_, value) = item?;
            records.push(HistoryRecord::deserialize(&value)?);
        }
        Ok(records)
    }

    /// Records whose commit id starts with `prefix`
    pub fn find_by_commit(&self, prefix: &str) -> Result<Vec<HistoryRecord>> {
        let mut found = Vec::new();
        for item in self.db.iter() {
            let (_, value) = item?;
            let record = HistoryRecord::deserialize(&value)?;
            if record.commit_id.starts_with(prefix) {
                found.push(record);
            }
        }
        Ok(found)
    }

    pub fn count(&self) -> usize {
        self.index.read().len()
    }

    fn read_seq(&self, seq: u64) -> Result<Option<HistoryRecord>> {
        match self.db.get(seq.to_be_bytes())? {
            Some(value) => Ok(Some(HistoryRecord::deserialize(&value)?)),
            None => Ok(None),
        }
    }
}

impl HistorySink for SemanticHistory {
    fn append(&self, record: &HistoryRecord) -> Result<()> {
        self.append_record(record).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_core::Fingerprint;
    use tempfile::TempDir;

    fn record(commit: &str) -> HistoryRecord {
        HistoryRecord::new(
            commit,
            format!("summary for {commit}"),
            vec![Change::observed_now("a.py", Fingerprint::Binary)],
            Some("intent".into()),
        )
        .with_source("offline", "")
    }

    #[test]
    fn test_append_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let history = SemanticHistory::open(temp_dir.path()).unwrap();
        let rec = record("c1");

        history.append_record(&rec).unwrap();
        assert_eq!(history.count(), 1);
        assert_eq!(history.get(&rec.id).unwrap(), Some(rec.clone()));
        assert_eq!(history.latest().unwrap(), Some(rec));
    }

    #[test]
    fn test_newest_first_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let history = SemanticHistory::open(temp_dir.path()).unwrap();
        for commit in ["c1", "c2", "c3"] {
            history.append_record(&record(commit)).unwrap();
        }

        let commits: Vec<String> = history
            .newest_first(2)
            .unwrap()
            .into_iter()
            .map(|r| r.commit_id)
            .collect();
        assert_eq!(commits, vec!["c3", "c2"]);
    }

    #[test]
    fn test_reopen_rebuilds_index_and_sequence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let history = SemanticHistory::open(temp_dir.path()).unwrap();
            history.append_record(&record("c1")).unwrap();
            history.append_record(&record("c2")).unwrap();
        }

        let history = SemanticHistory::open(temp_dir.path()).unwrap();
        assert_eq!(history.count(), 2);
        let seq = history.append_record(&record("c3")).unwrap();
        assert_eq!(seq, 3);
        assert_eq!(history.latest().unwrap().unwrap().commit_id, "c3");
        assert_eq!(history.find_by_commit("c2").unwrap().len(), 1);
    }
}
