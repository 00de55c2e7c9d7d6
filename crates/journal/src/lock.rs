//! Cross-process lock around `state.json` writes
//!
//! `stake watch` and the one-shot commands run as separate processes that all
//! rewrite the same state file. Each read-modify-write holds an exclusive
//! `flock` on `.stake/locks/state.lock` so no writer overwrites another's
//! update. The lock file itself is never removed; unlinking it while another
//! process waits on the old inode would let two writers in.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = "state.lock";

/// Held for one read-modify-write of the state file
pub struct StateLock {
    // Released when the descriptor closes
    _file: File,
}

impl StateLock {
    /// Block until the lock in `locks_dir` is ours
    pub fn acquire(locks_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(locks_dir).context("Failed to create locks directory")?;
        let path = locks_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        flock_exclusive(&file).with_context(|| format!("Failed to lock {}", path.display()))?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> Result<()> {
    use nix::errno::Errno;
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    loop {
        match flock(file.as_raw_fd(), FlockArg::LockExclusive) {
            Ok(()) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> Result<()> {
    Ok(())
}
