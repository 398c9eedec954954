use super::history::{GixHistory, HistoryError, HistorySource};
use crate::error::Result;
use crate::model::{CommitRecord, RepositoryHandle, TagInfo};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Replays commit history with a bounded retry when the repository is
/// locked by a concurrent writer.
pub struct CommitWalker<S = GixHistory> {
    source: S,
    attempts: u32,
    backoff: Duration,
}

impl<S: HistorySource> CommitWalker<S> {
    pub fn new(source: S, attempts: u32, backoff: Duration) -> Self {
        Self {
            source,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// All commits of `repo`. Lock contention is retried; when every attempt
    /// is locked out the records of the last attempt are returned.
    pub fn walk(&self, repo: &RepositoryHandle) -> Result<Vec<CommitRecord>> {
        let mut commits = Vec::new();
        for attempt in 1..=self.attempts {
            commits.clear();
            match self.source.walk_once(repo, &mut commits) {
                Ok(()) => return Ok(commits),
                Err(HistoryError::Locked(reason)) if attempt < self.attempts => {
                    warn!(
                        "{} is locked ({reason}), retrying in {} (attempt {attempt}/{})",
                        repo.name,
                        humantime::format_duration(self.backoff),
                        self.attempts
                    );
                    thread::sleep(self.backoff);
                }
                Err(HistoryError::Locked(reason)) => {
                    warn!(
                        "{} still locked after {} attempts ({reason}), using {} commits read so far",
                        repo.name,
                        self.attempts,
                        commits.len()
                    );
                }
                Err(HistoryError::Fatal(e)) => return Err(e),
            }
        }
        Ok(commits)
    }

    pub fn latest_tag(&self, path: &Path) -> Result<Option<TagInfo>> {
        self.source.latest_tag(path)
    }
}
