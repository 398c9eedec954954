use crate::error::{GitmetaError, Result};
use crate::model::RepositoryHandle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Shorter expressions would select most of an organization.
pub const MIN_EXPRESSION_LEN: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Regular expression that must match at the start of the name.
    #[default]
    Anchored,
    /// Plain substring containment.
    Contains,
}

#[derive(Debug, Clone)]
pub struct ProjectMatcher {
    kind: MatcherKind,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Anchored(Regex),
    Contains(String),
}

impl ProjectMatcher {
    pub fn new(expression: Option<&str>, mode: MatchMode) -> Result<Self> {
        let expression = validate_expression(expression)?;
        let kind = match mode {
            MatchMode::Anchored => {
                let regex = Regex::new(&format!("^(?:{expression})")).map_err(|e| {
                    GitmetaError::Configuration(format!("Invalid expression '{expression}': {e}"))
                })?;
                MatcherKind::Anchored(regex)
            }
            MatchMode::Contains => MatcherKind::Contains(expression.to_string()),
        };
        Ok(Self { kind })
    }

    pub fn is_match(&self, name: &str) -> bool {
        match &self.kind {
            MatcherKind::Anchored(regex) => regex.is_match(name),
            MatcherKind::Contains(needle) => name.contains(needle.as_str()),
        }
    }

    /// Handles whose name matches, in the map's order.
    pub fn select(&self, repos: &BTreeMap<String, PathBuf>) -> Vec<RepositoryHandle> {
        repos
            .iter()
            .filter(|(name, _)| self.is_match(name))
            .map(|(name, path)| RepositoryHandle {
                name: name.clone(),
                path: path.clone(),
            })
            .collect()
    }
}

fn validate_expression(expression: Option<&str>) -> Result<&str> {
    match expression {
        Some(expr) if expr.chars().count() >= MIN_EXPRESSION_LEN => Ok(expr),
        _ => Err(GitmetaError::Configuration(format!(
            "A filter expression is required before selecting repositories. \
             The filter should be at least {MIN_EXPRESSION_LEN} characters long."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo_map(names: &[&str]) -> BTreeMap<String, PathBuf> {
        names
            .iter()
            .map(|n| (n.to_string(), PathBuf::from("/repos/p").join(n)))
            .collect()
    }

    fn names(handles: &[RepositoryHandle]) -> Vec<&str> {
        handles.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn anchored_matches_start_only() {
        let m = ProjectMatcher::new(Some("alpha"), MatchMode::Anchored).unwrap();
        let repos = repo_map(&["alpha-1", "alpha-2", "team-alpha", "beta-1"]);
        assert_eq!(names(&m.select(&repos)), vec!["alpha-1", "alpha-2"]);
    }

    #[test]
    fn anchored_supports_regex() {
        let m = ProjectMatcher::new(Some("wp[12]-2023"), MatchMode::Anchored).unwrap();
        assert!(m.is_match("wp1-2023-team"));
        assert!(m.is_match("wp2-2023-team"));
        assert!(!m.is_match("wp3-2023-team"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let m = ProjectMatcher::new(Some("abc|xyz"), MatchMode::Anchored).unwrap();
        assert!(m.is_match("xyz-1"));
        assert!(!m.is_match("1-xyz"));
    }

    #[test]
    fn contains_mode_is_substring() {
        let m = ProjectMatcher::new(Some("alpha"), MatchMode::Contains).unwrap();
        let repos = repo_map(&["alpha-1", "team-alpha", "beta-1"]);
        assert_eq!(names(&m.select(&repos)), vec!["alpha-1", "team-alpha"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let m = ProjectMatcher::new(Some("alpha"), MatchMode::Anchored).unwrap();
        assert!(!m.is_match("Alpha-1"));
    }

    #[test]
    fn short_or_missing_expression_is_rejected() {
        for expr in [None, Some(""), Some("ab")] {
            let err = ProjectMatcher::new(expr, MatchMode::Anchored).unwrap_err();
            assert!(matches!(err, GitmetaError::Configuration(_)));
        }
        assert!(ProjectMatcher::new(Some("abc"), MatchMode::Contains).is_ok());
    }

    #[test]
    fn invalid_regex_is_configuration_error() {
        let err = ProjectMatcher::new(Some("abc("), MatchMode::Anchored).unwrap_err();
        assert!(matches!(err, GitmetaError::Configuration(_)));
    }
}
