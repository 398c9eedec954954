use super::backend::{GitCli, SyncBackend};
use super::catalog::{RemoteRepo, RepoCatalog};
use crate::config::{Project, Settings};
use crate::error::Result;
use crate::marker::{format_last_synced, SyncMarker};
use crate::matcher::ProjectMatcher;
use crate::model::ProjectOverview;
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Pull retry policy for one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullState {
    Attempting,
    Resetting,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Pulled,
    PulledAfterReset,
    Skipped,
}

/// What happened to each repository of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub project: String,
    pub updated_at: DateTime<Local>,
    pub cloned: Vec<String>,
    pub pulled: Vec<String>,
    pub reset: Vec<String>,
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn update_date(&self) -> String {
        format_last_synced(Some(self.updated_at))
    }
}

/// Brings a project's checkouts up to date and stamps its sync marker.
pub struct SyncOrchestrator<'a, B = GitCli> {
    settings: &'a Settings,
    backend: B,
    progress: bool,
}

impl<'a> SyncOrchestrator<'a, GitCli> {
    pub fn new(settings: &'a Settings) -> Self {
        Self::with_backend(settings, GitCli)
    }
}

impl<'a, B: SyncBackend> SyncOrchestrator<'a, B> {
    pub fn with_backend(settings: &'a Settings, backend: B) -> Self {
        Self {
            settings,
            backend,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn last_synced(&self, project: &str) -> Result<Option<DateTime<Local>>> {
        let project = self.settings.project(project)?;
        Ok(SyncMarker::for_dir(project.repos_dir()).last_synced())
    }

    /// Name, label and last sync time of every configured project.
    pub fn project_overview(&self) -> Vec<ProjectOverview> {
        self.settings
            .projects
            .iter()
            .map(|p| ProjectOverview {
                name: p.name.clone(),
                label: p.label.clone(),
                last_updated: format_last_synced(SyncMarker::for_dir(p.repos_dir()).last_synced()),
            })
            .collect()
    }

    /// Clone missing and pull existing repositories of `project` from the
    /// catalog. Per-repository failures are logged and skipped; the marker is
    /// touched once every repository has been visited.
    pub fn sync_project<C: RepoCatalog + ?Sized>(&self, project: &str, catalog: &C) -> Result<SyncReport> {
        let project = self.settings.project(project)?;
        let matcher = ProjectMatcher::new(project.expression.as_deref(), project.match_mode)?;
        let repos_dir = project.repos_dir();

        let selected: Vec<RemoteRepo> = catalog
            .repositories()?
            .into_iter()
            .filter(|r| matcher.is_match(&r.name))
            .collect();
        info!(
            "Syncing {} repositories of {} into {}",
            selected.len(),
            project.name,
            repos_dir.display()
        );
        fs::create_dir_all(&repos_dir)?;

        let pb = self.progress_bar(selected.len() as u64);
        let mut report = SyncReport {
            project: project.name.clone(),
            updated_at: Local::now(),
            cloned: Vec::new(),
            pulled: Vec::new(),
            reset: Vec::new(),
            skipped: Vec::new(),
        };

        for remote in &selected {
            pb.set_message(remote.name.clone());
            self.sync_repo(project, remote, &mut report);
            pb.inc(1);
        }
        pb.finish_and_clear();

        report.updated_at = SyncMarker::for_dir(&repos_dir).touch()?;
        info!(
            "Synced {}: {} cloned, {} pulled, {} reset, {} skipped",
            project.name,
            report.cloned.len(),
            report.pulled.len(),
            report.reset.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn sync_repo(&self, project: &Project, remote: &RemoteRepo, report: &mut SyncReport) {
        let dest = project.repos_dir().join(&remote.name);
        let name = remote.name.clone();

        if !dest.exists() {
            let url = remote.clone_url(&self.settings.github_organization);
            info!("Cloning {name}");
            match self.backend.clone_repo(&url, &dest) {
                Ok(()) => report.cloned.push(name),
                Err(e) => {
                    warn!("Error cloning {name}: {e} - skipping");
                    report.skipped.push(name);
                }
            }
            return;
        }

        if let Err(e) = gix::open(&dest) {
            warn!("Invalid repository {}: {e}", dest.display());
            report.skipped.push(name);
            return;
        }

        match self.pull_with_reset(&name, &dest) {
            PullOutcome::Pulled => report.pulled.push(name),
            PullOutcome::PulledAfterReset => report.reset.push(name),
            PullOutcome::Skipped => report.skipped.push(name),
        }
    }

    fn pull_with_reset(&self, name: &str, dest: &Path) -> PullOutcome {
        let branch = self.settings.default_branch.as_str();
        let mut state = PullState::Attempting;
        loop {
            state = match state {
                PullState::Attempting => {
                    info!("Pulling {name}");
                    match self.backend.pull(dest, branch) {
                        Ok(()) => return PullOutcome::Pulled,
                        Err(e) => {
                            warn!("Error pulling {name}: {e} - trying reset");
                            PullState::Resetting
                        }
                    }
                }
                PullState::Resetting => {
                    info!("Forcing repo reset on {name}");
                    if let Err(e) = self.backend.hard_reset(dest, branch) {
                        warn!("Error resetting {name}: {e}");
                    }
                    match self.backend.pull(dest, branch) {
                        Ok(()) => return PullOutcome::PulledAfterReset,
                        Err(e) => {
                            warn!("Error pulling {name}: {e} - skipping");
                            PullState::Exhausted
                        }
                    }
                }
                PullState::Exhausted => return PullOutcome::Skipped,
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}
