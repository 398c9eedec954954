use crate::error::Result;
use crate::marker::SyncMarker;
use crate::model::{AggregateKind, ProjectStats, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Aggregated results stored next to each project's checkouts, one file per
/// (kind, project). An entry is only served while it is at least as new as
/// the project's sync marker.
pub struct Cache {
    base_dir: PathBuf,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    stats: &'a ProjectStats,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    stats: ProjectStats,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl Cache {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.base_dir.join(project)
    }

    pub fn entry_path(&self, kind: AggregateKind, project: &str) -> PathBuf {
        self.project_dir(project).join(format!(".{kind}.cache"))
    }

    /// Valid iff the marker exists and is not newer than the entry.
    pub fn is_fresh(&self, kind: AggregateKind, project: &str) -> bool {
        let entry_mtime = match fs::metadata(self.entry_path(kind, project)).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(_) => return false,
        };
        match SyncMarker::for_dir(self.project_dir(project)).modified() {
            Some(marker_mtime) => marker_mtime <= entry_mtime,
            None => false,
        }
    }

    pub fn get(&self, kind: AggregateKind, project: &str) -> Option<ProjectStats> {
        let path = self.entry_path(kind, project);
        if !self.is_fresh(kind, project) {
            debug!("Cache refresh required for {}", path.display());
            return None;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Cache entry {} unreadable: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice::<VersionProbe>(&bytes) {
            Ok(probe) if probe.version == SCHEMA_VERSION => {}
            Ok(probe) => {
                debug!(
                    "Cache entry {} has schema version {}, expected {}",
                    path.display(),
                    probe.version,
                    SCHEMA_VERSION
                );
                return None;
            }
            Err(e) => {
                debug!("Cache entry {} is not a cache envelope: {e}", path.display());
                return None;
            }
        }

        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) if envelope.version == SCHEMA_VERSION && envelope.stats.kind() == kind => {
                debug!("Loading cached {kind} from {}", path.display());
                Some(envelope.stats)
            }
            Ok(_) => {
                debug!("Cache entry {} holds a different kind", path.display());
                None
            }
            Err(e) => {
                debug!("Cache entry {} failed to decode: {e}", path.display());
                None
            }
        }
    }

    /// Unconditionally replaces the entry for `stats.kind()`.
    pub fn put(&self, project: &str, stats: &ProjectStats) -> Result<()> {
        let path = self.entry_path(stats.kind(), project);
        fs::create_dir_all(self.project_dir(project))?;

        let envelope = EnvelopeRef {
            version: SCHEMA_VERSION,
            stats,
        };
        let tmp = path.with_extension("cache.tmp");
        fs::write(&tmp, serde_json::to_vec(&envelope)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Stored {} in {}", stats.kind(), path.display());
        Ok(())
    }
}
