use super::{unmatched_repos, SyncOrchestrator};
use crate::cli::CommonArgs;
use crate::model::SyncOutput;
use crate::stats::output_json;
use anyhow::Context;
use console::style;

pub fn exec_sync(common: &CommonArgs, project: &str, json: bool) -> anyhow::Result<()> {
    let settings = common.load_settings()?;
    let orchestrator = SyncOrchestrator::new(&settings).with_progress(!json);
    let report = orchestrator
        .sync_project(project, &settings.remotes)
        .with_context(|| format!("Failed to sync {project}"))?;

    if json {
        output_json(&SyncOutput {
            result: "success".to_string(),
            update_date: report.update_date(),
        })
    } else {
        println!(
            "{} {} at {}",
            style("Synced").green().bold(),
            style(&report.project).cyan(),
            report.update_date()
        );
        println!(
            "  cloned {}, pulled {}, reset {}, skipped {}",
            report.cloned.len(),
            report.pulled.len(),
            report.reset.len(),
            report.skipped.len()
        );
        for name in &report.skipped {
            println!("  {} {}", style("skipped").yellow(), name);
        }
        Ok(())
    }
}

pub fn exec_projects(common: &CommonArgs, json: bool) -> anyhow::Result<()> {
    let settings = common.load_settings()?;
    let overview = SyncOrchestrator::new(&settings).project_overview();

    if json {
        return output_json(&overview);
    }
    if overview.is_empty() {
        println!("No projects configured");
        return Ok(());
    }
    let width = overview.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for project in &overview {
        println!(
            "{:<width$}  {:<16}  {}",
            style(&project.name).bold(),
            project.last_updated,
            project.label
        );
    }
    Ok(())
}

pub fn exec_unmatched(common: &CommonArgs, json: bool) -> anyhow::Result<()> {
    let settings = common.load_settings()?;
    let unmatched = unmatched_repos(&settings.remotes, &settings.projects)
        .context("Failed to list unmatched repositories")?;

    if json {
        let listing: Vec<_> = unmatched
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "clone_url": r.clone_url(&settings.github_organization),
                })
            })
            .collect();
        return output_json(&listing);
    }
    if unmatched.is_empty() {
        println!("Every repository belongs to a project");
        return Ok(());
    }
    for repo in &unmatched {
        println!("{}  {}", repo.name, style(repo.clone_url(&settings.github_organization)).dim());
    }
    Ok(())
}
