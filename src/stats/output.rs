use super::aggregate::week_labels;
use crate::model::{Dataset, RepoCount, RepoTag, RepoTimes, RepoWeeks, RequiredFilesState, TimesOutput, WeeksOutput};
use anyhow::Result;
use console::style;
use serde::Serialize;

pub fn times_output(labels: Vec<String>, repos: &[RepoTimes]) -> TimesOutput {
    TimesOutput {
        labels,
        dataset: repos
            .iter()
            .map(|r| Dataset {
                label: r.name.clone(),
                data: r.time_brackets.clone(),
            })
            .collect(),
    }
}

pub fn weeks_output(repos: &[RepoWeeks]) -> WeeksOutput {
    WeeksOutput {
        labels: week_labels(repos),
        data: repos
            .iter()
            .map(|r| Dataset {
                label: r.name.clone(),
                data: r.week_brackets.clone(),
            })
            .collect(),
    }
}

pub fn output_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn header(title: &str, project: &str) {
    println!("{} {}", style(title).bold(), style(project).cyan());
    println!("{}", "─".repeat(50));
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0).max(4)
}

pub fn output_times(project: &str, output: &TimesOutput) -> Result<()> {
    header("Commits per hour", project);
    if output.dataset.is_empty() {
        println!("No repositories matched");
        return Ok(());
    }

    let max = output
        .dataset
        .iter()
        .flat_map(|d| d.data.values())
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);

    for set in &output.dataset {
        println!("{}", style(&set.label).bold());
        for label in &output.labels {
            let count = set.data.get(label).copied().unwrap_or(0);
            let width = (count as f64 / max as f64 * 30.0).round() as usize;
            println!("  {label} {:>4} {}", count, style("█".repeat(width)).green());
        }
    }
    Ok(())
}

pub fn output_weeks(project: &str, output: &WeeksOutput) -> Result<()> {
    header("Commits per ISO week", project);
    if output.data.is_empty() {
        println!("No repositories matched");
        return Ok(());
    }

    let width = name_width(output.data.iter().map(|d| d.label.as_str()));
    print!("{:<width$}", "repo");
    for week in &output.labels {
        print!(" {:>4}", week);
    }
    println!();
    for set in &output.data {
        print!("{:<width$}", set.label);
        for week in &output.labels {
            match set.data.get(week) {
                Some(count) => print!(" {:>4}", style(count).green()),
                None => print!(" {:>4}", style("·").dim()),
            }
        }
        println!();
    }
    Ok(())
}

pub fn output_counts(project: &str, counts: &[RepoCount]) -> Result<()> {
    header("Commit count", project);
    let width = name_width(counts.iter().map(|c| c.name.as_str()));
    for count in counts {
        println!("{:<width$} {:>6}", count.name, count.number_commits);
    }
    let total: usize = counts.iter().map(|c| c.number_commits).sum();
    println!("{}", style(format!("{:<width$} {:>6}", "total", total)).bold());
    Ok(())
}

pub fn output_tags(project: &str, tags: &[RepoTag]) -> Result<()> {
    header("Latest tags", project);
    let width = name_width(tags.iter().map(|t| t.name.as_str()));
    for tag in tags {
        if tag.has_tag() {
            println!("{:<width$} {} {}", tag.name, style(&tag.tag).green(), tag.date);
        } else {
            println!("{:<width$} {}", tag.name, style(&tag.tag).dim());
        }
    }
    Ok(())
}

pub fn output_required_files(project: &str, states: &[RequiredFilesState]) -> Result<()> {
    header("Required files", project);
    let width = name_width(states.iter().map(|s| s.name.as_str()));
    for state in states {
        let marks: Vec<String> = state
            .files
            .iter()
            .map(|(name, found)| {
                if *found {
                    style(format!("✓ {name}")).green().to_string()
                } else {
                    style(format!("✗ {name}")).red().to_string()
                }
            })
            .collect();
        println!(
            "{:<width$} {}/{}  {}",
            state.name,
            state.required_files,
            state.files.len(),
            marks.join("  ")
        );
    }
    Ok(())
}
