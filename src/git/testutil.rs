//! Helpers for building throwaway repositories with the system `git`.

use std::fs;
use std::path::Path;
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str], date: Option<&str>) {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    if let Some(date) = date {
        cmd.env("GIT_AUTHOR_DATE", date).env("GIT_COMMITTER_DATE", date);
    }
    let status = cmd.status().unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A valid checkout without any commits, created without the `git` binary.
pub fn init_empty_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    gix::init(dir).unwrap();
}

pub fn init_git_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"], None);
    git(dir, &["config", "user.email", "you@example.com"], None);
    git(dir, &["config", "user.name", "Your Name"], None);
    git(dir, &["config", "commit.gpgsign", "false"], None);
    git(dir, &["config", "tag.gpgsign", "false"], None);
}

/// Empty commit authored at `date` (RFC 3339).
pub fn commit_at(dir: &Path, date: &str) {
    git(dir, &["commit", "-q", "--allow-empty", "-m", date], Some(date));
}

pub fn commit_file(dir: &Path, name: &str, content: &str, date: &str) {
    fs::write(dir.join(name), content).unwrap();
    git(dir, &["add", name], None);
    git(dir, &["commit", "-q", "-m", &format!("add {name}")], Some(date));
}

pub fn tag(dir: &Path, name: &str) {
    git(dir, &["tag", name], None);
}

pub fn annotated_tag(dir: &Path, name: &str, date: &str) {
    git(dir, &["tag", "-a", name, "-m", name], Some(date));
}
