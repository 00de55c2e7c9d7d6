//! Git backend via the `git` executable
//!
//! Shells out rather than linking a git library, the same way publishing
//! drives an external VCS CLI: the executable handles hooks, config and
//! index locking for us.

use crate::backend::{UncommittedPaths, VcsBackend, VcsError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const GIT: &str = "git";

#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Backend for the repository containing `root`
    ///
    /// Fails with `NotARepository` if `root` is not inside a git work tree.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VcsError> {
        let cli = Self::new(root);
        match cli.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(out) if String::from_utf8_lossy(&out.stdout).trim() == "true" => Ok(cli),
            Ok(_) | Err(VcsError::CommandFailed { .. }) => Err(VcsError::NotARepository(cli.root)),
            Err(e) => Err(e),
        }
    }

    /// Backend without checking that `root` is a repository
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a `git` executable can be spawned
    pub fn available() -> bool {
        Command::new(GIT)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        let output = Command::new(GIT)
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|source| VcsError::Spawn {
                program: GIT.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(VcsError::CommandFailed {
                command: format!("{} {}", GIT, args.join(" ")),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Run a command whose stdout is a NUL-separated path list
    fn run_paths(&self, args: &[&str], into: &mut UncommittedPaths) -> Result<(), VcsError> {
        let output = self.run(args)?;
        for path in split_nul(&output.stdout) {
            into.insert(path);
        }
        Ok(())
    }
}

/// Split `-z` output into paths, dropping empty fields
fn split_nul(stdout: &[u8]) -> impl Iterator<Item = String> + '_ {
    stdout
        .split(|b| *b == 0)
        .filter(|field| !field.is_empty())
        .map(|field| String::from_utf8_lossy(field).into_owned())
}

impl VcsBackend for GitCli {
    fn list_uncommitted(&self) -> Result<Vec<String>, VcsError> {
        let mut paths = UncommittedPaths::new();
        // Staged, then unstaged, then untracked; `--relative` keeps every
        // list relative to the project root when it is a subdirectory.
        self.run_paths(&["diff", "--cached", "--name-only", "--relative", "-z"], &mut paths)?;
        self.run_paths(&["diff", "--name-only", "--relative", "-z"], &mut paths)?;
        self.run_paths(
            &["ls-files", "--others", "--exclude-standard", "-z"],
            &mut paths,
        )?;
        tracing::debug!(count = paths.len(), "git uncommitted paths");
        Ok(paths.as_slice().to_vec())
    }

    fn stage_all(&self) -> Result<(), VcsError> {
        self.run(&["add", "-A", "--", "."])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String, VcsError> {
        match self.run(&["commit", "--quiet", "-m", message]) {
            Ok(_) => {}
            Err(VcsError::CommandFailed { code: Some(1), stderr, .. }) if stderr.is_empty() => {
                // git reports an empty index on stdout with exit code 1
                return Err(VcsError::NothingToCommit);
            }
            Err(e) => return Err(e),
        }

        let head = self.run(&["rev-parse", "HEAD"])?;
        let id = String::from_utf8_lossy(&head.stdout).trim().to_string();
        if id.is_empty() {
            return Err(VcsError::Parse {
                command: "git rev-parse HEAD".to_string(),
                detail: "empty commit id".to_string(),
            });
        }
        Ok(id)
    }

    fn name(&self) -> &'static str {
        "git"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nul_skips_empty_fields() {
        let out = b"a.py\0dir/b c.py\0\0";
        let paths: Vec<String> = split_nul(out).collect();
        assert_eq!(paths, vec!["a.py", "dir/b c.py"]);
    }
}
