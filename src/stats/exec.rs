use super::aggregate::sort_counts_desc;
use super::output::{
    output_counts, output_json, output_required_files, output_tags, output_times, output_weeks, times_output,
    weeks_output,
};
use super::StatsService;
use crate::cli::CommonArgs;
use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Times,
    Weeks,
    Count,
    Tags,
    RequiredFiles,
}

pub fn exec(common: &CommonArgs, query: Query, project: &str, json: bool, ignore_cache: bool) -> anyhow::Result<()> {
    let settings = common.load_settings()?;
    let service = StatsService::new(&settings).context("Failed to initialize statistics service")?;

    match query {
        Query::Times => {
            let (labels, repos) = service
                .commit_times(project, ignore_cache)
                .with_context(|| format!("Failed to compute commit times for {project}"))?;
            let output = times_output(labels, &repos);
            if json {
                output_json(&output)
            } else {
                output_times(project, &output)
            }
        }
        Query::Weeks => {
            let repos = service
                .commit_weeks(project, ignore_cache)
                .with_context(|| format!("Failed to compute commit weeks for {project}"))?;
            let output = weeks_output(&repos);
            if json {
                output_json(&output)
            } else {
                output_weeks(project, &output)
            }
        }
        Query::Count => {
            let mut counts = service
                .commit_counts(project, ignore_cache)
                .with_context(|| format!("Failed to count commits for {project}"))?;
            sort_counts_desc(&mut counts);
            if json {
                output_json(&counts)
            } else {
                output_counts(project, &counts)
            }
        }
        Query::Tags => {
            let tags = service
                .tag_states(project, ignore_cache)
                .with_context(|| format!("Failed to read tags for {project}"))?;
            if json {
                output_json(&tags)
            } else {
                output_tags(project, &tags)
            }
        }
        Query::RequiredFiles => {
            let states = service
                .required_files(project, ignore_cache)
                .with_context(|| format!("Failed to check required files for {project}"))?;
            if json {
                output_json(&states)
            } else {
                output_required_files(project, &states)
            }
        }
    }
}
