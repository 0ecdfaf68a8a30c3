//! Raw-record snapshot files

use crate::error::{Result, ResultExt};
use crate::transform::RawElectionRecord;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of every snapshot file name
pub const SNAPSHOT_PREFIX: &str = "election_guide";

/// Timestamp format shared by snapshot and log file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Writes the records loaded by a run to `<dir>/election_guide_<timestamp>.json`
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for a run started at `at`
    pub fn path_for(&self, at: NaiveDateTime) -> PathBuf {
        self.dir.join(format!(
            "{SNAPSHOT_PREFIX}_{}.json",
            at.format(FILE_TIMESTAMP_FORMAT)
        ))
    }

    /// Write `records` as a pretty JSON array; returns the final path
    ///
    /// The file is written next to its destination and renamed into place,
    /// so readers never see a partial snapshot.
    pub async fn write(&self, records: &[RawElectionRecord], at: NaiveDateTime) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create snapshot directory {}", self.dir.display()))?;

        let contents = serde_json::to_string_pretty(records)?;
        let path = self.path_for(at);
        let temp_path = path.with_extension("tmp");

        tokio::fs::write(&temp_path, &contents)
            .await
            .with_context(|| format!("Failed to write snapshot {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to rename snapshot to {}", path.display()))?;

        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }
}
