use crate::error::{GitmetaError, Result};
use crate::model::{CommitRecord, RepoCount, RepoWeeks};
use chrono::{Datelike, Timelike};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// "00:00" through "23:00".
pub fn time_labels() -> Vec<String> {
    (0..24).map(hour_label).collect()
}

/// Commits per author-local hour. Always has all 24 keys.
pub fn hour_histogram(commits: &[CommitRecord]) -> BTreeMap<String, u32> {
    let mut brackets: BTreeMap<String, u32> = time_labels().into_iter().map(|l| (l, 0)).collect();
    for commit in commits {
        *brackets.entry(hour_label(commit.authored_at.hour())).or_insert(0) += 1;
    }
    brackets
}

/// Commits per ISO week number. The year is deliberately not part of the
/// key, so week 1 of two different years lands in one bucket.
pub fn week_histogram(commits: &[CommitRecord]) -> BTreeMap<String, u32> {
    let mut brackets = BTreeMap::new();
    for commit in commits {
        let week = commit.authored_at.iso_week().week().to_string();
        *brackets.entry(week).or_insert(0) += 1;
    }
    brackets
}

pub fn commit_count(commits: &[CommitRecord]) -> usize {
    commits.len()
}

/// Distinct week keys across all repositories, in numeric order.
pub fn week_labels(repos: &[RepoWeeks]) -> Vec<String> {
    let weeks: BTreeSet<u32> = repos
        .iter()
        .flat_map(|r| r.week_brackets.keys())
        .filter_map(|w| w.parse().ok())
        .collect();
    weeks.into_iter().map(|w| w.to_string()).collect()
}

pub fn sort_counts_desc(counts: &mut [RepoCount]) {
    counts.sort_by(|a, b| b.number_commits.cmp(&a.number_commits));
}

pub fn compile_required_files(patterns: &BTreeMap<String, String>) -> Result<BTreeMap<String, Regex>> {
    patterns
        .iter()
        .map(|(name, pattern)| {
            Regex::new(&format!("^(?:{pattern})"))
                .map(|re| (name.clone(), re))
                .map_err(|e| {
                    GitmetaError::Configuration(format!(
                        "Invalid required file pattern {name} '{pattern}': {e}"
                    ))
                })
        })
        .collect()
}

/// Which required files exist at the top level of `dir`. A file counts when
/// its pattern matches the start of an entry name.
pub fn required_files(dir: &Path, patterns: &BTreeMap<String, Regex>) -> Result<BTreeMap<String, bool>> {
    let entries: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();

    Ok(patterns
        .iter()
        .map(|(name, re)| (name.clone(), entries.iter().any(|entry| re.is_match(entry))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn at(ts: &str) -> CommitRecord {
        CommitRecord {
            repo: "alpha-1".into(),
            authored_at: DateTime::parse_from_rfc3339(ts).unwrap(),
        }
    }

    #[test]
    fn labels_are_fixed() {
        let labels = time_labels();
        assert_eq!(labels.len(), 24);
        assert_eq!(labels[0], "00:00");
        assert_eq!(labels[9], "09:00");
        assert_eq!(labels[23], "23:00");
    }

    #[test]
    fn empty_history_has_all_hours_zero() {
        let hist = hour_histogram(&[]);
        assert_eq!(hist.len(), 24);
        assert!(hist.values().all(|&v| v == 0));
    }

    #[test]
    fn hours_use_author_offset() {
        let commits = vec![
            at("2023-10-02T09:10:00+02:00"),
            at("2023-10-02T09:59:00+02:00"),
            at("2023-10-02T14:00:00-07:00"),
            at("2023-10-03T14:30:00+00:00"),
            at("2023-10-04T23:45:00+05:30"),
        ];
        let hist = hour_histogram(&commits);
        assert_eq!(hist.len(), 24);
        assert_eq!(hist["09:00"], 2);
        assert_eq!(hist["14:00"], 2);
        assert_eq!(hist["23:00"], 1);
        assert_eq!(hist.values().sum::<u32>() as usize, commits.len());
    }

    #[test]
    fn weeks_are_sparse_iso_numbers() {
        let commits = vec![
            at("2023-01-02T10:00:00+00:00"), // week 1
            at("2023-01-08T10:00:00+00:00"), // still week 1 (Sunday)
            at("2023-03-06T10:00:00+00:00"), // week 10
        ];
        let hist = week_histogram(&commits);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist["1"], 2);
        assert_eq!(hist["10"], 1);
    }

    #[test]
    fn same_week_of_different_years_collides() {
        let commits = vec![at("2023-01-03T10:00:00+00:00"), at("2024-01-02T10:00:00+00:00")];
        let hist = week_histogram(&commits);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist["1"], 2);
    }

    #[test]
    fn week_labels_sort_numerically() {
        let repos = vec![
            RepoWeeks {
                name: "a".into(),
                week_brackets: [("10".to_string(), 1), ("2".to_string(), 3)].into_iter().collect(),
            },
            RepoWeeks {
                name: "b".into(),
                week_brackets: [("2".to_string(), 1), ("41".to_string(), 2)].into_iter().collect(),
            },
        ];
        assert_eq!(week_labels(&repos), vec!["2", "10", "41"]);
    }

    #[test]
    fn counts_sort_descending() {
        let mut counts = vec![
            RepoCount { name: "a".into(), number_commits: 1 },
            RepoCount { name: "b".into(), number_commits: 7 },
            RepoCount { name: "c".into(), number_commits: 3 },
        ];
        sort_counts_desc(&mut counts);
        let names: Vec<_> = counts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(commit_count(&[at("2023-10-02T09:00:00+00:00")]), 1);
    }

    #[test]
    fn required_files_match_entry_prefix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();

        let patterns: BTreeMap<String, String> = [
            ("readme".to_string(), "README".to_string()),
            ("docs".to_string(), "docs$".to_string()),
            ("license".to_string(), "LICEN[CS]E".to_string()),
            ("markdown".to_string(), "md".to_string()),
        ]
        .into_iter()
        .collect();
        let compiled = compile_required_files(&patterns).unwrap();
        let found = required_files(dir.path(), &compiled).unwrap();

        assert_eq!(found["readme"], true);
        assert_eq!(found["docs"], true);
        assert_eq!(found["license"], false);
        assert_eq!(found["markdown"], false);
    }

    #[test]
    fn bad_required_pattern_is_configuration_error() {
        let patterns: BTreeMap<String, String> =
            [("broken".to_string(), "([".to_string())].into_iter().collect();
        assert!(matches!(
            compile_required_files(&patterns),
            Err(GitmetaError::Configuration(_))
        ));
    }
}
