//! Shared support types for the cardbox library.
//!
//! This module contains the crate-wide `Result` alias and the small value
//! types passed between the store, the query engine, and callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::CardboxError;

/// A specialized Result type for cardbox operations.
pub type Result<T> = std::result::Result<T, CardboxError>;

/// One aggregated facet entry: a distinct tag value and how many records
/// reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    /// The tag value as stored on the records
    pub tag: String,
    /// Number of records (active plus archived) carrying the tag
    pub count: usize,
}

/// Generation stamp for a deferred operation.
///
/// A stamp is issued before starting a long-running operation and presented
/// back when the result arrives. A stamp issued before the last call to
/// `RecordStore::invalidate_deferred` is stale and its mutation is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpStamp(pub(crate) u64);

/// Outcome of a deferred operation handed to `apply_if_current`.
#[derive(Debug, PartialEq, Eq)]
pub enum Deferred<T> {
    /// The stamp was still current and the operation ran.
    Applied(T),
    /// The stamp was stale; the operation was silently dropped.
    Discarded,
}

impl<T> Deferred<T> {
    /// Returns true if the operation was dropped as stale.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Deferred::Discarded)
    }

    /// Unwraps the applied value, if any.
    pub fn into_applied(self) -> Option<T> {
        match self {
            Deferred::Applied(value) => Some(value),
            Deferred::Discarded => None,
        }
    }
}

/// Summary of a backup restoration operation
#[derive(Debug, Clone)]
pub struct RestoreSummary {
    /// Path to the backup file that was restored
    pub backup_file: PathBuf,
    /// Number of active records restored
    pub records_restored: usize,
    /// Number of archived records restored
    pub archived_restored: usize,
}
