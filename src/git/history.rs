use crate::error::{GitmetaError, Result};
use crate::model::{CommitRecord, RepositoryHandle, TagInfo};
use chrono::{DateTime, FixedOffset};
use gix::{ObjectId, Repository};
use std::collections::HashSet;
use std::error::Error as StdError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Outcome of a single pass over a repository's history.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Another process holds one of the repository's lock files.
    #[error("Repository is locked: {0}")]
    Locked(String),
    #[error(transparent)]
    Fatal(#[from] GitmetaError),
}

/// Read access to checkouts. One call is one attempt; retrying is the
/// caller's business.
pub trait HistorySource {
    /// Push every commit reachable from any ref into `sink`. Records read
    /// before a failure stay in `sink`.
    fn walk_once(
        &self,
        repo: &RepositoryHandle,
        sink: &mut Vec<CommitRecord>,
    ) -> std::result::Result<(), HistoryError>;

    /// The tag whose commit is the most recent, if any. Ties go to the tag
    /// name that sorts last.
    fn latest_tag(&self, path: &Path) -> Result<Option<TagInfo>>;
}

/// [`HistorySource`] backed by gitoxide.
#[derive(Debug, Default, Clone, Copy)]
pub struct GixHistory;

impl HistorySource for GixHistory {
    fn walk_once(
        &self,
        handle: &RepositoryHandle,
        sink: &mut Vec<CommitRecord>,
    ) -> std::result::Result<(), HistoryError> {
        let repo = gix::open(&handle.path).map_err(classify)?;
        let tips = ref_tips(&repo)?;
        if tips.is_empty() {
            debug!("{} has no commits yet", handle.name);
            return Ok(());
        }

        let walk = repo.rev_walk(tips).all().map_err(classify)?;
        for info in walk {
            let info = info.map_err(classify)?;
            let commit = repo.find_commit(info.id).map_err(classify)?;
            let author = commit.author().map_err(classify)?;
            let time = author.time().map_err(classify)?;
            sink.push(CommitRecord {
                repo: handle.name.clone(),
                authored_at: to_datetime(time)?,
            });
        }
        Ok(())
    }

    fn latest_tag(&self, path: &Path) -> Result<Option<TagInfo>> {
        let repo = gix::open(path)?;
        let platform = repo
            .references()
            .map_err(|e| GitmetaError::History(format!("Cannot read refs of {}: {e}", path.display())))?;
        let tags = platform
            .tags()
            .map_err(|e| GitmetaError::History(format!("Cannot list tags of {}: {e}", path.display())))?;

        let mut latest: Option<TagInfo> = None;
        for reference in tags {
            let mut reference = reference.map_err(|e| GitmetaError::History(e.to_string()))?;
            let name = reference.name().shorten().to_string();
            let id = match reference.peel_to_id_in_place() {
                Ok(id) => id.detach(),
                Err(e) => {
                    debug!("Tag {name} in {} does not resolve: {e}", path.display());
                    continue;
                }
            };
            let commit = match repo.find_object(id)?.try_into_commit() {
                Ok(commit) => commit,
                Err(_) => {
                    debug!("Tag {name} in {} does not point at a commit", path.display());
                    continue;
                }
            };
            let committed_at = to_datetime(commit.time()?)?;
            // On equal commit times the tag sorting last by name wins.
            let newer = latest.as_ref().map_or(true, |l| {
                (committed_at, name.as_str()) >= (l.committed_at, l.name.as_str())
            });
            if newer {
                latest = Some(TagInfo { name, committed_at });
            }
        }
        Ok(latest)
    }
}

/// Commits at the end of every ref plus a detached HEAD. Refs that do not
/// resolve to a commit are ignored.
fn ref_tips(repo: &Repository) -> std::result::Result<Vec<ObjectId>, HistoryError> {
    let mut seen = HashSet::new();
    let mut tips = Vec::new();

    let platform = repo.references().map_err(classify)?;
    for reference in platform.all().map_err(classify)? {
        let mut reference = reference.map_err(|e| classify_dyn(e.as_ref()))?;
        let id = match reference.peel_to_id_in_place() {
            Ok(id) => id.detach(),
            Err(e) => {
                debug!("Ignoring ref {}: {e}", reference.name().as_bstr());
                continue;
            }
        };
        if is_commit(repo, id) && seen.insert(id) {
            tips.push(id);
        }
    }

    if let Ok(head) = repo.head_id() {
        let id = head.detach();
        if is_commit(repo, id) && seen.insert(id) {
            tips.push(id);
        }
    }
    Ok(tips)
}

fn is_commit(repo: &Repository, id: ObjectId) -> bool {
    repo.find_object(id)
        .map(|obj| obj.kind == gix::object::Kind::Commit)
        .unwrap_or(false)
}

fn to_datetime(time: gix::date::Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset)
        .ok_or_else(|| GitmetaError::InvalidDate(format!("Invalid offset: {}", time.offset)))?;
    DateTime::from_timestamp(time.seconds, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| GitmetaError::InvalidDate(format!("Invalid timestamp: {}", time.seconds)))
}

fn classify<E: StdError + 'static>(err: E) -> HistoryError {
    classify_dyn(&err)
}

fn classify_dyn(err: &(dyn StdError + 'static)) -> HistoryError {
    if is_lock_error(err) {
        HistoryError::Locked(err.to_string())
    } else {
        HistoryError::Fatal(GitmetaError::History(err.to_string()))
    }
}

/// Walks the source chain looking for lock-file contention. Only error kinds
/// are compared; message text can contain paths and is never inspected.
pub(crate) fn is_lock_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(gix::lock::acquire::Error::PermanentlyLocked { .. }) =
            e.downcast_ref::<gix::lock::acquire::Error>()
        {
            return true;
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::AlreadyExists
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testutil::{annotated_tag, commit_at, has_git, init_empty_repo, init_git_repo, tag};
    use chrono::Timelike;
    use pretty_assertions::assert_eq;
    use std::process::Command;
    use tempfile::tempdir;

    fn handle(path: &Path) -> RepositoryHandle {
        RepositoryHandle {
            name: "repo".to_string(),
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn unborn_history_is_empty() {
        let dir = tempdir().unwrap();
        init_empty_repo(dir.path());

        let mut sink = Vec::new();
        GixHistory.walk_once(&handle(dir.path()), &mut sink).unwrap();
        assert!(sink.is_empty());
        assert_eq!(GixHistory.latest_tag(dir.path()).unwrap(), None);
    }

    #[test]
    fn missing_checkout_is_fatal() {
        let dir = tempdir().unwrap();
        let mut sink = Vec::new();
        let err = GixHistory
            .walk_once(&handle(&dir.path().join("gone")), &mut sink)
            .unwrap_err();
        assert!(matches!(err, HistoryError::Fatal(_)));
    }

    #[test]
    fn walks_author_times_with_offset() {
        if !has_git() {
            return;
        }
        let dir = tempdir().unwrap();
        init_git_repo(dir.path());
        commit_at(dir.path(), "2023-10-02T09:15:00+02:00");
        commit_at(dir.path(), "2023-10-03T23:30:00-05:00");

        let mut sink = Vec::new();
        GixHistory.walk_once(&handle(dir.path()), &mut sink).unwrap();
        let mut hours: Vec<u32> = sink.iter().map(|c| c.authored_at.hour()).collect();
        hours.sort();
        assert_eq!(hours, vec![9, 23]);
        assert!(sink.iter().all(|c| c.repo == "repo"));
    }

    #[test]
    fn includes_commits_from_every_branch() {
        if !has_git() {
            return;
        }
        let dir = tempdir().unwrap();
        init_git_repo(dir.path());
        commit_at(dir.path(), "2023-10-02T09:00:00+00:00");
        let status = Command::new("git")
            .args(["checkout", "-q", "-b", "feature"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success());
        commit_at(dir.path(), "2023-10-02T10:00:00+00:00");
        commit_at(dir.path(), "2023-10-02T11:00:00+00:00");
        let status = Command::new("git")
            .args(["checkout", "-q", "-"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success());

        let mut sink = Vec::new();
        GixHistory.walk_once(&handle(dir.path()), &mut sink).unwrap();
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn latest_tag_prefers_newest_commit() {
        if !has_git() {
            return;
        }
        let dir = tempdir().unwrap();
        init_git_repo(dir.path());
        commit_at(dir.path(), "2023-10-02T09:00:00+00:00");
        tag(dir.path(), "zz-old");
        commit_at(dir.path(), "2023-11-06T14:00:00+00:00");
        annotated_tag(dir.path(), "a-new", "2023-11-07T08:00:00+00:00");

        let latest = GixHistory.latest_tag(dir.path()).unwrap().unwrap();
        assert_eq!(latest.name, "a-new");
        assert_eq!(
            latest.committed_at,
            DateTime::parse_from_rfc3339("2023-11-06T14:00:00+00:00").unwrap()
        );
    }

    #[test]
    fn tie_on_commit_time_goes_to_last_tag_name() {
        if !has_git() {
            return;
        }
        let dir = tempdir().unwrap();
        init_git_repo(dir.path());
        commit_at(dir.path(), "2023-10-02T09:00:00+00:00");
        commit_at(dir.path(), "2023-10-09T16:30:00+00:00");
        tag(dir.path(), "v1.0");
        tag(dir.path(), "v1.0-final");

        let latest = GixHistory.latest_tag(dir.path()).unwrap().unwrap();
        assert_eq!(latest.name, "v1.0-final");
        assert_eq!(
            latest.committed_at,
            DateTime::parse_from_rfc3339("2023-10-09T16:30:00+00:00").unwrap()
        );
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("could not update refs")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn lock_errors_are_recognised() {
        let exists = std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "Unable to create '/repo/.git/index.lock': File exists",
        );
        assert!(is_lock_error(&Wrapped(exists)));
        let busy = std::io::Error::new(std::io::ErrorKind::WouldBlock, "busy");
        assert!(is_lock_error(&busy));
    }

    #[test]
    fn lock_words_in_paths_are_not_contention() {
        let missing = std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "/srv/repos/unlocked-2023/alpha-1 does not appear to be a git repository",
        );
        assert!(!is_lock_error(&missing));
        let stale = std::io::Error::new(
            std::io::ErrorKind::Other,
            "object missing in /srv/repos/wp1/team.lock/objects",
        );
        assert!(!is_lock_error(&Wrapped(stale)));
    }

    #[test]
    fn vanished_checkout_under_lock_like_name_is_fatal() {
        let dir = tempdir().unwrap();
        let mut sink = Vec::new();
        let err = GixHistory
            .walk_once(&handle(&dir.path().join("unlocked-2023/alpha-1")), &mut sink)
            .unwrap_err();
        assert!(matches!(err, HistoryError::Fatal(_)));
    }
}
