use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Bumped whenever the on-disk shape of [`ProjectStats`] changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const NO_TAGS: &str = "No tags";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub repo: String,
    /// Author time in the author's own offset.
    pub authored_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub committed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    CommitTimes,
    CommitWeeks,
    CommitCount,
    TagState,
    RequiredFiles,
}

impl AggregateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::CommitTimes => "commit_times",
            AggregateKind::CommitWeeks => "commit_weeks",
            AggregateKind::CommitCount => "commit_count",
            AggregateKind::TagState => "tagged_state",
            AggregateKind::RequiredFiles => "required_files",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTimes {
    pub name: String,
    pub time_brackets: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoWeeks {
    pub name: String,
    pub week_brackets: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCount {
    pub name: String,
    pub number_commits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTag {
    pub name: String,
    pub tag: String,
    pub date: String,
}

impl RepoTag {
    pub fn tagged(name: &str, info: &TagInfo) -> Self {
        Self {
            name: name.to_string(),
            tag: info.name.clone(),
            date: info.committed_at.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        }
    }

    pub fn untagged(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: NO_TAGS.to_string(),
            date: NO_TAGS.to_string(),
        }
    }

    pub fn has_tag(&self) -> bool {
        self.tag != NO_TAGS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredFilesState {
    pub name: String,
    pub files: BTreeMap<String, bool>,
    pub required_files: usize,
}

/// Everything the cache knows how to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "repos", rename_all = "snake_case")]
pub enum ProjectStats {
    Times(Vec<RepoTimes>),
    Weeks(Vec<RepoWeeks>),
    Counts(Vec<RepoCount>),
    Tags(Vec<RepoTag>),
    RequiredFiles(Vec<RequiredFilesState>),
}

impl ProjectStats {
    pub fn kind(&self) -> AggregateKind {
        match self {
            ProjectStats::Times(_) => AggregateKind::CommitTimes,
            ProjectStats::Weeks(_) => AggregateKind::CommitWeeks,
            ProjectStats::Counts(_) => AggregateKind::CommitCount,
            ProjectStats::Tags(_) => AggregateKind::TagState,
            ProjectStats::RequiredFiles(_) => AggregateKind::RequiredFiles,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimesOutput {
    pub labels: Vec<String>,
    pub dataset: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeksOutput {
    pub labels: Vec<String>,
    pub data: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutput {
    pub result: String,
    pub update_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureOutput {
    pub result: String,
    pub status: u16,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectOverview {
    pub name: String,
    pub label: String,
    pub last_updated: String,
}
