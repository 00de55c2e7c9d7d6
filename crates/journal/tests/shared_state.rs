//! Two ledgers on one project, as `stake watch` and `stake stake` are

use chrono::Utc;
use journal::{Change, ChangeLedger, Stake};
use stake_core::config::CacheConfig;
use stake_core::{CacheLayer, Fingerprint, Layout};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const ROUNDS: usize = 150;

fn owner(layout: &Layout) -> Arc<ChangeLedger> {
    // Each owner gets its own caches, like a separate process would
    let caches = CacheLayer::system(&CacheConfig::default());
    Arc::new(ChangeLedger::open(layout, &caches))
}

fn change(path: String) -> Change {
    Change::new(path, Fingerprint::from("1111111111111111".to_string()), Utc::now())
}

fn empty_stake(n: usize) -> Stake {
    Stake {
        name: format!("s{}", n),
        message: "checkpoint".into(),
        created_at: Utc::now(),
        changes: vec![],
        commit_id: Some(format!("c{}", n)),
    }
}

#[test]
fn test_interleaved_writers_lose_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path());
    let caches = CacheLayer::system(&CacheConfig::default());
    ChangeLedger::init(&layout, &caches, Some("parser".into())).unwrap();

    let watcher = owner(&layout);
    let staker = owner(&layout);

    let appends = {
        let ledger = Arc::clone(&watcher);
        thread::spawn(move || {
            for i in 0..ROUNDS {
                assert!(ledger.append_if_new(change(format!("src/f{}.py", i))).unwrap());
            }
        })
    };
    let stakes = {
        let ledger = Arc::clone(&staker);
        thread::spawn(move || {
            for i in 0..ROUNDS {
                ledger.record_stake(empty_stake(i)).unwrap();
            }
        })
    };
    appends.join().unwrap();
    stakes.join().unwrap();

    let reader = owner(&layout);
    let state = reader.state();
    assert_eq!(
        (state.pending_changes.len(), state.stakes.len()),
        (ROUNDS, ROUNDS)
    );
    assert_eq!(state.intent.as_deref(), Some("parser"));
}

#[test]
fn test_stake_from_stale_owner_keeps_newer_changes() {
    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path());
    let caches = CacheLayer::system(&CacheConfig::default());
    ChangeLedger::init(&layout, &caches, None).unwrap();

    let watcher = owner(&layout);
    let staker = owner(&layout);

    watcher.append_if_new(change("a.py".into())).unwrap();
    let snapshot = staker.pending_changes();
    assert_eq!(snapshot.len(), 1);

    // Lands while the stake is being committed; the staker's cache never saw it
    watcher.append_if_new(change("b.py".into())).unwrap();

    staker
        .record_stake(Stake {
            changes: snapshot,
            ..empty_stake(1)
        })
        .unwrap();

    let pending = owner(&layout).pending_changes();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].path, "b.py");
    assert!(layout.locks_dir().join("state.lock").exists());
}
