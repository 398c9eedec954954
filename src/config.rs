use crate::error::{GitmetaError, Result};
use crate::git::walker::{DEFAULT_ATTEMPTS, DEFAULT_BACKOFF};
use crate::matcher::MatchMode;
use crate::sync::RemoteRepo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "gitmeta.yml";
const ENV_PREFIX: &str = "GITMETA";

/// Process-wide settings, loaded once at startup and handed to each component.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub git_repo_dir: PathBuf,
    #[serde(default)]
    pub github_organization: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Pause between history walk attempts, in humantime notation ("5s").
    #[serde(default = "default_walk_backoff")]
    pub walk_backoff: String,
    #[serde(default = "default_walk_attempts")]
    pub walk_attempts: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub remotes: Vec<RemoteRepo>,
}

/// A named group of repositories selected by `expression`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub required_files: BTreeMap<String, String>,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_walk_backoff() -> String {
    humantime::format_duration(DEFAULT_BACKOFF).to_string()
}

fn default_walk_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

impl Project {
    pub fn new(name: &str, expression: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            expression: expression.map(str::to_string),
            required_files: BTreeMap::new(),
            match_mode: MatchMode::default(),
            base_dir: PathBuf::new(),
        }
    }

    pub fn with_required_file(mut self, name: &str, pattern: &str) -> Self {
        self.required_files.insert(name.to_string(), pattern.to_string());
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Directory holding this project's checkouts, marker and cache files.
    pub fn repos_dir(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }
}

impl Settings {
    pub fn new<P: AsRef<Path>>(git_repo_dir: P, projects: Vec<Project>) -> Self {
        let mut settings = Self {
            git_repo_dir: git_repo_dir.as_ref().to_path_buf(),
            github_organization: String::new(),
            default_branch: default_branch(),
            walk_backoff: default_walk_backoff(),
            walk_attempts: default_walk_attempts(),
            projects,
            remotes: Vec::new(),
        };
        settings.attach_base_dir();
        settings
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !file.exists() {
            return Err(GitmetaError::Configuration(format!(
                "Settings file {} does not exist",
                file.display()
            )));
        }

        let built = config::Config::builder()
            .add_source(config::File::from(file))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = built.try_deserialize()?;
        settings.attach_base_dir();
        settings.validate()?;
        Ok(settings)
    }

    /// Point every project at a different checkout root.
    pub fn with_repo_dir<P: AsRef<Path>>(mut self, git_repo_dir: P) -> Self {
        self.git_repo_dir = git_repo_dir.as_ref().to_path_buf();
        self.attach_base_dir();
        self
    }

    fn attach_base_dir(&mut self) {
        for project in &mut self.projects {
            project.base_dir = self.git_repo_dir.clone();
            if project.label.is_empty() {
                project.label = project.name.clone();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.walk_attempts == 0 {
            return Err(GitmetaError::Configuration(
                "walk_attempts must be greater than 0".to_string(),
            ));
        }
        self.walk_backoff()?;

        let mut seen = HashSet::new();
        for project in &self.projects {
            if !seen.insert(project.name.as_str()) {
                return Err(GitmetaError::Configuration(format!(
                    "Project {} is declared more than once",
                    project.name
                )));
            }
        }
        Ok(())
    }

    pub fn walk_backoff(&self) -> Result<Duration> {
        humantime::parse_duration(&self.walk_backoff).map_err(|e| {
            GitmetaError::Configuration(format!("Invalid walk_backoff '{}': {e}", self.walk_backoff))
        })
    }

    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| GitmetaError::ProjectNotFound(name.to_string()))
    }
}
