//! Lock file that keeps a single `stake watch` per project

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "watch.lock";

/// Held for the lifetime of a watch loop
pub struct WatchLock {
    path: PathBuf,
    // The flock lives as long as the descriptor
    _file: File,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl WatchLock {
    /// Take the lock in `locks_dir`
    ///
    /// Fails if another live process holds it. A lock left behind by a dead
    /// process is reclaimed.
    pub fn acquire(locks_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(locks_dir).context("Failed to create locks directory")?;
        let path = locks_dir.join(LOCK_FILE);

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if !try_flock_exclusive(&file)? {
            match read_content(&mut file) {
                Ok(content) if is_process_alive(content.pid) => {
                    anyhow::bail!("Already watching (pid {})", content.pid)
                }
                _ => {
                    tracing::warn!(path = %path.display(), "Removing stale watch lock");
                    drop(file);
                    std::fs::remove_file(&path)?;
                    return Self::acquire(locks_dir);
                }
            }
        }

        write_content(&mut file)?;
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WatchLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn write_content(file: &mut File) -> Result<()> {
    let content = LockContent {
        pid: std::process::id(),
        started_at: chrono::Utc::now(),
    };
    let serialized = serde_json::to_string(&content).context("Failed to serialize lock content")?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn read_content(file: &mut File) -> Result<LockContent> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).context("Failed to parse lock content")
}

#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(target_os = "linux"))]
fn is_process_alive(_pid: u32) -> bool {
    // Without /proc, assume the holder is alive
    true
}
