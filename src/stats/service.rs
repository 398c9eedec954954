use super::aggregate::{
    commit_count, compile_required_files, hour_histogram, required_files, time_labels, week_histogram,
};
use crate::cache::Cache;
use crate::config::{Project, Settings};
use crate::error::{GitmetaError, Result};
use crate::git::{discover, CommitWalker, GixHistory, HistorySource};
use crate::matcher::ProjectMatcher;
use crate::model::{
    AggregateKind, ProjectStats, RepoCount, RepoTag, RepoTimes, RepoWeeks, RepositoryHandle,
    RequiredFilesState,
};
use tracing::{debug, warn};

/// Answers per-project statistic queries, going through the cache.
pub struct StatsService<'a, S = GixHistory> {
    settings: &'a Settings,
    cache: Cache,
    walker: CommitWalker<S>,
}

impl<'a> StatsService<'a, GixHistory> {
    pub fn new(settings: &'a Settings) -> Result<Self> {
        let walker = CommitWalker::new(GixHistory, settings.walk_attempts, settings.walk_backoff()?);
        Ok(Self::with_walker(settings, walker))
    }
}

impl<'a, S: HistorySource> StatsService<'a, S> {
    pub fn with_walker(settings: &'a Settings, walker: CommitWalker<S>) -> Self {
        Self {
            settings,
            cache: Cache::new(&settings.git_repo_dir),
            walker,
        }
    }

    pub fn walker(&self) -> &CommitWalker<S> {
        &self.walker
    }

    /// Hour-of-day histogram per repository, with the 24 labels.
    pub fn commit_times(&self, project: &str, ignore_cache: bool) -> Result<(Vec<String>, Vec<RepoTimes>)> {
        let stats = self.cached_or_compute(AggregateKind::CommitTimes, project, ignore_cache, |_, repos| {
            let mut results = Vec::with_capacity(repos.len());
            for repo in repos {
                let commits = self.walker.walk(repo)?;
                results.push(RepoTimes {
                    name: repo.name.clone(),
                    time_brackets: hour_histogram(&commits),
                });
            }
            Ok(ProjectStats::Times(results))
        })?;
        match stats {
            ProjectStats::Times(results) => Ok((time_labels(), results)),
            other => Err(kind_mismatch(AggregateKind::CommitTimes, &other)),
        }
    }

    pub fn commit_weeks(&self, project: &str, ignore_cache: bool) -> Result<Vec<RepoWeeks>> {
        let stats = self.cached_or_compute(AggregateKind::CommitWeeks, project, ignore_cache, |_, repos| {
            let mut results = Vec::with_capacity(repos.len());
            for repo in repos {
                let commits = self.walker.walk(repo)?;
                results.push(RepoWeeks {
                    name: repo.name.clone(),
                    week_brackets: week_histogram(&commits),
                });
            }
            Ok(ProjectStats::Weeks(results))
        })?;
        match stats {
            ProjectStats::Weeks(results) => Ok(results),
            other => Err(kind_mismatch(AggregateKind::CommitWeeks, &other)),
        }
    }

    pub fn commit_counts(&self, project: &str, ignore_cache: bool) -> Result<Vec<RepoCount>> {
        let stats = self.cached_or_compute(AggregateKind::CommitCount, project, ignore_cache, |_, repos| {
            let mut results = Vec::with_capacity(repos.len());
            for repo in repos {
                let commits = self.walker.walk(repo)?;
                results.push(RepoCount {
                    name: repo.name.clone(),
                    number_commits: commit_count(&commits),
                });
            }
            Ok(ProjectStats::Counts(results))
        })?;
        match stats {
            ProjectStats::Counts(results) => Ok(results),
            other => Err(kind_mismatch(AggregateKind::CommitCount, &other)),
        }
    }

    pub fn tag_states(&self, project: &str, ignore_cache: bool) -> Result<Vec<RepoTag>> {
        let stats = self.cached_or_compute(AggregateKind::TagState, project, ignore_cache, |_, repos| {
            let mut results = Vec::with_capacity(repos.len());
            for repo in repos {
                let state = match self.walker.latest_tag(&repo.path)? {
                    Some(tag) => RepoTag::tagged(&repo.name, &tag),
                    None => RepoTag::untagged(&repo.name),
                };
                results.push(state);
            }
            Ok(ProjectStats::Tags(results))
        })?;
        match stats {
            ProjectStats::Tags(results) => Ok(results),
            other => Err(kind_mismatch(AggregateKind::TagState, &other)),
        }
    }

    pub fn required_files(&self, project: &str, ignore_cache: bool) -> Result<Vec<RequiredFilesState>> {
        let stats = self.cached_or_compute(AggregateKind::RequiredFiles, project, ignore_cache, |project, repos| {
            let patterns = compile_required_files(&project.required_files)?;
            let mut results = Vec::with_capacity(repos.len());
            for repo in repos {
                let files = required_files(&repo.path, &patterns)?;
                let satisfied = files.values().filter(|&&found| found).count();
                results.push(RequiredFilesState {
                    name: repo.name.clone(),
                    files,
                    required_files: satisfied,
                });
            }
            Ok(ProjectStats::RequiredFiles(results))
        })?;
        match stats {
            ProjectStats::RequiredFiles(results) => Ok(results),
            other => Err(kind_mismatch(AggregateKind::RequiredFiles, &other)),
        }
    }

    /// Validate the project, scan the checkouts, then serve from the cache or
    /// run `compute` over the matched repositories and store its result.
    fn cached_or_compute<F>(
        &self,
        kind: AggregateKind,
        project_name: &str,
        ignore_cache: bool,
        compute: F,
    ) -> Result<ProjectStats>
    where
        F: FnOnce(&Project, &[RepositoryHandle]) -> Result<ProjectStats>,
    {
        let project = self.settings.project(project_name)?;
        let matcher = ProjectMatcher::new(project.expression.as_deref(), project.match_mode)?;
        let repo_map = discover(&self.settings.git_repo_dir);

        if !ignore_cache {
            if let Some(stats) = self.cache.get(kind, &project.name) {
                return Ok(stats);
            }
        }

        let repos = matcher.select(&repo_map);
        debug!("Computing {kind} for {} over {} repositories", project.name, repos.len());
        let stats = compute(project, &repos)?;
        if let Err(e) = self.cache.put(&project.name, &stats) {
            warn!("Could not store {kind} cache for {}: {e}", project.name);
        }
        Ok(stats)
    }
}

fn kind_mismatch(expected: AggregateKind, got: &ProjectStats) -> GitmetaError {
    GitmetaError::Cache(format!("Expected {expected} results, got {}", got.kind()))
}
