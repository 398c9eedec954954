use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scan `base_dir/<project>/<repo>` and map every valid checkout's name to
/// its path. Invalid checkouts are logged and left out.
///
/// Names are unique across projects in the returned map. When two projects
/// hold a checkout with the same name, the one whose path sorts first is kept
/// and the later one is logged and dropped.
pub fn discover<P: AsRef<Path>>(base_dir: P) -> BTreeMap<String, PathBuf> {
    let base = base_dir.as_ref();
    let mut repos = BTreeMap::new();
    if !base.is_dir() {
        debug!("Repository directory {} does not exist", base.display());
        return repos;
    }

    let walker = WalkBuilder::new(base)
        .standard_filters(false)
        .hidden(true)
        .max_depth(Some(2))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {e}", base.display());
                continue;
            }
        };
        if entry.depth() != 2 || !entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }

        let path = entry.path();
        if let Err(e) = gix::open(path) {
            warn!("Invalid git repository: {} ({e})", path.display());
            continue;
        }

        let name = repo_name(&path.to_string_lossy());
        if let Some(existing) = repos.get(&name) {
            warn!(
                "Repository name {name} at {} already seen at {}",
                path.display(),
                existing.display()
            );
            continue;
        }
        repos.insert(name, path.to_path_buf());
    }

    debug!("Discovered {} repositories under {}", repos.len(), base.display());
    repos
}

/// Final path segment, accepting either separator.
pub fn repo_name(path: &str) -> String {
    path.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testutil::init_empty_repo;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn name_is_last_segment_for_both_separators() {
        assert_eq!(repo_name("/srv/repos/alpha/alpha-1"), "alpha-1");
        assert_eq!(repo_name(r"D:\drive\repos\alpha\alpha-2"), "alpha-2");
        assert_eq!(repo_name("plain"), "plain");
    }

    #[test]
    fn finds_checkouts_two_levels_deep() {
        let dir = tempdir().unwrap();
        init_empty_repo(&dir.path().join("alpha/alpha-1"));
        init_empty_repo(&dir.path().join("alpha/alpha-2"));
        init_empty_repo(&dir.path().join("beta/beta-1"));

        let repos = discover(dir.path());
        assert_eq!(
            repos.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["alpha-1", "alpha-2", "beta-1"]
        );
        assert_eq!(repos["beta-1"], dir.path().join("beta/beta-1"));
    }

    #[test]
    fn invalid_checkouts_and_files_are_skipped() {
        let dir = tempdir().unwrap();
        init_empty_repo(&dir.path().join("alpha/alpha-1"));
        fs::create_dir_all(dir.path().join("alpha/not-a-repo")).unwrap();
        fs::write(dir.path().join("alpha/.last_update"), b"").unwrap();
        fs::write(dir.path().join("alpha/.commit_times.cache"), b"{}").unwrap();
        fs::write(dir.path().join("alpha/notes.txt"), b"").unwrap();

        let repos = discover(dir.path());
        assert_eq!(repos.keys().map(String::as_str).collect::<Vec<_>>(), vec!["alpha-1"]);
    }

    #[test]
    fn does_not_descend_past_repo_level() {
        let dir = tempdir().unwrap();
        init_empty_repo(&dir.path().join("alpha/group/nested"));

        assert!(discover(dir.path()).is_empty());
    }

    #[test]
    fn missing_base_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(discover(dir.path().join("nope")).is_empty());
    }

    #[test]
    fn first_duplicate_name_wins() {
        let dir = tempdir().unwrap();
        init_empty_repo(&dir.path().join("alpha/shared"));
        init_empty_repo(&dir.path().join("beta/shared"));

        let repos = discover(dir.path());
        assert_eq!(repos.len(), 1);
        assert_eq!(repos["shared"], dir.path().join("alpha/shared"));
    }
}
