use crate::config::Settings;
use crate::error::GitmetaError;
use crate::model::FailureOutput;
use crate::stats::{output_json, Query};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gitmeta")]
#[command(about = "Commit activity statistics across the repositories of a project")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to settings file (default: gitmeta.yml)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Override the directory holding project checkouts")]
    pub repo_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn load_settings(&self) -> Result<Settings> {
        let settings = Settings::load(self.config.as_deref()).context("Failed to load settings")?;
        Ok(match &self.repo_dir {
            Some(dir) => settings.with_repo_dir(dir),
            None => settings,
        })
    }
}

#[derive(Args, Clone)]
pub struct QueryArgs {
    #[arg(help = "Project name")]
    pub project: String,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Recompute even when a fresh cache entry exists")]
    pub ignore_cache: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commits per hour of day for each repository
    Times(QueryArgs),
    /// Commits per ISO week for each repository
    Weeks(QueryArgs),
    /// Number of commits per repository
    Count(QueryArgs),
    /// Most recent tag of each repository
    Tags(QueryArgs),
    /// Which required files each repository contains
    RequiredFiles(QueryArgs),
    /// Clone or pull every repository of a project
    Sync {
        #[arg(help = "Project name")]
        project: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Configured projects and when they were last synced
    Projects {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Remote repositories no project expression matches
    Unmatched {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Times(q)
            | Commands::Weeks(q)
            | Commands::Count(q)
            | Commands::Tags(q)
            | Commands::RequiredFiles(q) => q.json,
            Commands::Sync { json, .. } | Commands::Projects { json } | Commands::Unmatched { json } => *json,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.common.verbose);
        let json = self.command.json();
        let result = self.dispatch();
        if let (true, Err(err)) = (json, &result) {
            output_json(&failure_output(err))?;
        }
        result
    }

    fn dispatch(self) -> Result<()> {
        let common = &self.common;
        match self.command {
            Commands::Times(q) => query(common, Query::Times, q),
            Commands::Weeks(q) => query(common, Query::Weeks, q),
            Commands::Count(q) => query(common, Query::Count, q),
            Commands::Tags(q) => query(common, Query::Tags, q),
            Commands::RequiredFiles(q) => query(common, Query::RequiredFiles, q),
            Commands::Sync { project, json } => crate::sync::exec::exec_sync(common, &project, json),
            Commands::Projects { json } => crate::sync::exec::exec_projects(common, json),
            Commands::Unmatched { json } => crate::sync::exec::exec_unmatched(common, json),
        }
    }
}

fn query(common: &CommonArgs, query: Query, args: QueryArgs) -> Result<()> {
    crate::stats::exec(common, query, &args.project, args.json, args.ignore_cache)
}

/// Payload printed on stdout when a JSON command fails.
pub fn failure_output(err: &anyhow::Error) -> FailureOutput {
    let (status, error) = match err.downcast_ref::<GitmetaError>() {
        Some(e) if e.is_client_error() => (400, e.to_string()),
        Some(e) => (500, e.to_string()),
        None => (500, format!("{err:#}")),
    };
    FailureOutput {
        result: "failed".to_string(),
        status,
        error,
    }
}
