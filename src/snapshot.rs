//! Durable snapshot format for a record store.
//!
//! The whole store (active and archived collections plus the id sequence
//! counter) serializes to one JSON document per namespace. Writes go through
//! a temporary file in the target directory followed by an atomic rename so
//! a crash mid-write never leaves a truncated snapshot behind.

use std::{fs, path::Path};

use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{CardboxError, Record, Result};

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// JSON-serializable snapshot of a whole record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for forward-compatibility checks on load
    pub format_version: u32,
    /// Next value of the monotonic id sequence
    pub next_seq: u64,
    /// Active records in insertion order
    pub records: Vec<Record>,
    /// Archived records in archival order
    pub archived: Vec<Record>,
}

impl Snapshot {
    /// An empty snapshot at the current format version.
    pub fn empty() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_seq: 1,
            records: Vec::new(),
            archived: Vec::new(),
        }
    }

    /// Serializes to the canonical JSON form.
    ///
    /// Field order follows struct declaration order, so serializing the same
    /// snapshot twice (or a freshly deserialized copy) is byte-identical.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(CardboxError::Serialization)
    }

    /// Parses and validates a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Loads a snapshot from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading snapshot from file: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to open snapshot file {}: {}", path.display(), e);
            CardboxError::Io(e)
        })?;
        let snapshot = Self::from_json(&content)?;
        trace!(
            "Loaded snapshot: {} active, {} archived",
            snapshot.records.len(),
            snapshot.archived.len()
        );
        Ok(snapshot)
    }

    /// Writes the snapshot atomically to the given path.
    ///
    /// Failures are reported as `SnapshotWrite` so callers can treat them as
    /// the non-fatal persistence class rather than a store error.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        debug!("Creating temporary snapshot file in: {}", dir.display());

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary snapshot file: {}", e);
            CardboxError::SnapshotWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let json = self.to_json()?;

        use std::io::Write;
        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write temporary snapshot file: {}", e);
            CardboxError::SnapshotWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary snapshot file: {}", e);
            CardboxError::SnapshotWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        // Atomically move the temporary file to the target location
        temp_file.persist(path).map_err(|e| {
            error!("Failed to persist snapshot {}: {}", path.display(), e.error);
            CardboxError::SnapshotWrite {
                path: path.to_path_buf(),
                source: e.error,
            }
        })?;

        debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(CardboxError::InvalidFormat {
                message: format!(
                    "Unknown snapshot format version {} (supported up to {})",
                    self.format_version, SNAPSHOT_FORMAT_VERSION
                ),
            });
        }
        let mut seen_ids = std::collections::HashSet::new();
        for record in self.records.iter().chain(self.archived.iter()) {
            if record.id.is_empty() {
                return Err(CardboxError::InvalidFormat {
                    message: format!("Record '{}' has an empty ID", record.title),
                });
            }
            if !seen_ids.insert(record.id.as_str()) {
                return Err(CardboxError::InvalidFormat {
                    message: format!("Duplicate record ID: {}", record.id),
                });
            }
            if record.updated_at < record.created_at {
                return Err(CardboxError::InvalidFormat {
                    message: format!("Record {} updated before it was created", record.id),
                });
            }
        }
        Ok(())
    }
}
