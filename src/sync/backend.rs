use crate::error::{GitmetaError, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Mutating git operations used while syncing a project.
pub trait SyncBackend {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Check out `branch` and pull it from `origin`.
    fn pull(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Discard local state and move `branch` to `origin/<branch>`.
    fn hard_reset(&self, repo: &Path, branch: &str) -> Result<()>;
}

/// [`SyncBackend`] that runs the system `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitCli {
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        debug!("Running git {}", args.join(" "));

        let output = cmd
            .output()
            .map_err(|e| GitmetaError::Sync(format!("Failed to run git: {e}")))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GitmetaError::Sync(format!(
            "git {} failed ({}): {}",
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        )))
    }
}

impl SyncBackend for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run(None, &["clone", "--quiet", url, &dest])
    }

    fn pull(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(Some(repo), &["checkout", "--quiet", branch])?;
        self.run(Some(repo), &["pull", "--quiet", "origin", branch])
    }

    fn hard_reset(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(Some(repo), &["reset", "--hard", "--quiet", &format!("origin/{branch}")])
    }
}
