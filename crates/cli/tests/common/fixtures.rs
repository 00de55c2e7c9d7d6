//! Throwaway git repositories for workflow tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A git work tree with one initial commit
pub struct TestProject {
    _dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// `None` when git is not installed
    pub fn new() -> Result<Option<Self>> {
        if !git_available() {
            eprintln!("git not available, skipping");
            return Ok(None);
        }

        let dir = TempDir::new()?;
        let root = dir.path().canonicalize()?;
        let project = Self { _dir: dir, root };

        project.git(&["init", "--quiet"])?;
        project.git(&["config", "user.email", "dev@example.com"])?;
        project.git(&["config", "user.name", "Dev"])?;
        project.git(&["config", "commit.gpgsign", "false"])?;
        project.write("README.md", "# demo\n")?;
        project.git(&["add", "-A"])?;
        project.git(&["commit", "--quiet", "-m", "initial"])?;
        Ok(Some(project))
    }

    /// A directory that is not a git work tree
    pub fn bare_dir() -> Result<TempDir> {
        Ok(TempDir::new()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))
    }

    /// Run git in the project and return stdout
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .context("Failed to run git")?;
        if !output.status.success() {
            anyhow::bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Subject lines of the commit log, newest first
    pub fn log_subjects(&self) -> Result<Vec<String>> {
        Ok(self
            .git(&["log", "--format=%s"])?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
