//! Error types for the cardbox library.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during record management operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for cardbox operations.
#[derive(Error, Debug)]
pub enum CardboxError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record was not found when performing an operation.
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// Input was rejected before any state change.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Snapshot content on disk is malformed or from an unknown format version.
    #[error("Invalid snapshot format: {message}")]
    InvalidFormat { message: String },

    /// The durable-cache write failed. The in-memory store is not rolled back.
    #[error("Failed to write snapshot {path}: {source}")]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Errors related to backup operations.
    #[error("Backup failed: {message}")]
    BackupFailed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_display() {
        let err = CardboxError::RecordNotFound {
            id: "1700000000000-12".to_string(),
        };
        assert_eq!(err.to_string(), "Record not found: 1700000000000-12");
    }

    #[test]
    fn test_validation_display() {
        let err = CardboxError::Validation {
            message: "title must not be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Validation failed: title must not be empty");
    }

    #[test]
    fn test_snapshot_write_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::Other, "quota exceeded");
        let err = CardboxError::SnapshotWrite {
            path: PathBuf::from("/tmp/notes.json"),
            source: io_err,
        };
        let shown = err.to_string();
        assert!(shown.contains("/tmp/notes.json"));
        assert!(shown.contains("quota exceeded"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: CardboxError = json_err.into();
        assert!(matches!(err, CardboxError::Serialization(_)));
    }
}
