use crate::config::Project;
use crate::error::Result;
use crate::matcher::ProjectMatcher;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A repository hosted on the remote organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteRepo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
}

impl RemoteRepo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            clone_url: None,
        }
    }

    /// The configured URL, or the organization's https URL for `name`.
    pub fn clone_url(&self, organization: &str) -> String {
        match &self.clone_url {
            Some(url) => url.clone(),
            None => format!("https://github.com/{organization}/{}.git", self.name),
        }
    }
}

/// Source of the remote repository listing.
pub trait RepoCatalog {
    fn repositories(&self) -> Result<Vec<RemoteRepo>>;
}

impl RepoCatalog for Vec<RemoteRepo> {
    fn repositories(&self) -> Result<Vec<RemoteRepo>> {
        Ok(self.clone())
    }
}

/// Catalog repositories no project claims. Projects whose expression is
/// unusable are left out of the comparison.
pub fn unmatched_repos<C: RepoCatalog + ?Sized>(catalog: &C, projects: &[Project]) -> Result<Vec<RemoteRepo>> {
    let matchers: Vec<ProjectMatcher> = projects
        .iter()
        .filter_map(|p| match ProjectMatcher::new(p.expression.as_deref(), p.match_mode) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Ignoring project {} for unmatched listing: {e}", p.name);
                None
            }
        })
        .collect();

    Ok(catalog
        .repositories()?
        .into_iter()
        .filter(|repo| !matchers.iter().any(|m| m.is_match(&repo.name)))
        .collect())
}
