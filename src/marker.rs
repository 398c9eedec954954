use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const LAST_UPDATE_FILE: &str = ".last_update";

/// The `.last_update` file of one project directory. Its mtime is the
/// instant of the last completed sync.
#[derive(Debug, Clone)]
pub struct SyncMarker {
    path: PathBuf,
}

impl SyncMarker {
    pub fn for_dir<P: AsRef<Path>>(repos_dir: P) -> Self {
        Self {
            path: repos_dir.as_ref().join(LAST_UPDATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    pub fn last_synced(&self) -> Option<DateTime<Local>> {
        self.modified().map(DateTime::<Local>::from)
    }

    /// Create the marker if needed and move its mtime to now.
    pub fn touch(&self) -> Result<DateTime<Local>> {
        self.touch_at(SystemTime::now())
    }

    pub fn touch_at(&self, when: SystemTime) -> Result<DateTime<Local>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.set_modified(when)?;
        Ok(DateTime::<Local>::from(when))
    }
}

pub fn format_last_synced(when: Option<DateTime<Local>>) -> String {
    match when {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "Never".to_string(),
    }
}
