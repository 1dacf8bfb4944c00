use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use walkdir::WalkDir;

use crate::{
    facets, filtered_view, ranked_search, CardboxError, Config, Deferred, FacetCount,
    FilterConfig, OpStamp, Record, RecordDraft, RecordPatch, RestoreSummary, Result, Snapshot,
    SortKey, SNAPSHOT_FORMAT_VERSION,
};

/// Which collection a record currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shelf {
    Active,
    Archived,
}

/// Every state transition the store can make, in one auditable place.
///
/// Public mutating methods validate their input, build one of these, and hand
/// it to [`RecordStore::apply`]; nothing else touches the collections.
#[derive(Debug)]
enum Mutation {
    Create(Record),
    Update { id: String, patch: RecordPatch },
    Delete { id: String },
    Archive { id: String },
    Restore { id: String },
}

/// Manages the authoritative, ordered collections of records and mirrors
/// them write-through to a durable JSON snapshot.
///
/// The store is single-threaded and synchronous: mutations apply in call
/// order, the persistence write is issued after each mutation, and consumers
/// read derived, borrowed views. Memory is authoritative for the session;
/// persistence is best-effort (see [`RecordStore::last_persist_error`]).
pub struct RecordStore {
    /// Store configuration
    config: Config,

    /// Active records in insertion order (the base order for queries)
    active: Vec<Record>,

    /// Archived records, disjoint from the active collection
    archived: Vec<Record>,

    /// Monotonic sequence component of assigned ids; never reused, even
    /// after deletes
    next_seq: u64,

    /// Generation counter for deferred-operation staleness checks
    generation: u64,

    /// Last write-through failure, kept for a non-fatal UI warning
    last_persist_error: Option<String>,
}

impl RecordStore {
    /// Opens a store, creating its directories and loading any existing
    /// snapshot for the configured namespace.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the store
    ///
    /// # Returns
    ///
    /// The opened store, or an error if a directory could not be created or
    /// an existing snapshot is unreadable.
    pub fn open(config: Config) -> Result<Self> {
        info!(
            "Opening RecordStore: namespace={}, data_dir={}",
            config.namespace,
            config.data_dir.display()
        );

        // Ensure the data directory exists
        if !config.data_dir.exists() {
            debug!("Data directory does not exist, creating: {}", config.data_dir.display());
            fs::create_dir_all(&config.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                CardboxError::DirectoryError {
                    path: config.data_dir.clone(),
                }
            })?;
        }

        // Ensure the backup directory exists
        if !config.backup_dir.exists() {
            debug!(
                "Backup directory does not exist, creating: {}",
                config.backup_dir.display()
            );
            fs::create_dir_all(&config.backup_dir).map_err(|e| {
                error!("Failed to create backup directory: {}", e);
                CardboxError::DirectoryError {
                    path: config.backup_dir.clone(),
                }
            })?;
        }

        // Load the existing snapshot, if any
        let snapshot_path = config.snapshot_path();
        let snapshot = if snapshot_path.exists() {
            Snapshot::load(&snapshot_path)?
        } else {
            debug!("No snapshot at {}, starting empty", snapshot_path.display());
            Snapshot::empty()
        };

        info!(
            "Loaded {} active and {} archived records",
            snapshot.records.len(),
            snapshot.archived.len()
        );

        Ok(Self {
            config,
            active: snapshot.records,
            archived: snapshot.archived,
            next_seq: snapshot.next_seq,
            generation: 0,
            last_persist_error: None,
        })
    }

    /// The store's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Active records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.active
    }

    /// Archived records.
    pub fn archived_records(&self) -> &[Record] {
        &self.archived
    }

    /// Looks a record up by id in either collection.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.active
            .iter()
            .find(|r| r.id == id)
            .or_else(|| self.archived.iter().find(|r| r.id == id))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Creates a new record from a draft.
    ///
    /// Assigns a fresh id, sets both timestamps to now, appends to the end of
    /// the active collection, and persists. Duplicate submissions are not
    /// deduplicated.
    pub fn create(&mut self, draft: RecordDraft) -> Result<Record> {
        if draft.title.trim().is_empty() {
            return Err(CardboxError::Validation {
                message: "title must not be empty".to_string(),
            });
        }

        let now = Utc::now();
        let id = format!("{}-{}", now.timestamp_millis(), self.next_seq);
        self.next_seq += 1;

        let record = Record {
            id,
            title: draft.title,
            body: draft.body,
            tags: crate::normalize_tags(draft.tags),
            occurred_at: draft.occurred_at,
            pinned: draft.pinned,
            favorite: draft.favorite,
            size: draft.size,
            created_at: now,
            updated_at: now,
        };

        info!("Creating record: {}", record.id);
        let created = self.apply(Mutation::Create(record))?;
        self.write_through();
        Ok(created)
    }

    /// Merges a patch into an existing record and bumps `updated_at`.
    ///
    /// Applies to a record in either collection. Fails fast with
    /// `Validation` before any state change if the patch empties the title,
    /// and with `RecordNotFound` if the id is absent.
    pub fn update(&mut self, id: &str, patch: RecordPatch) -> Result<Record> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(CardboxError::Validation {
                    message: "title must not be empty".to_string(),
                });
            }
        }

        info!("Updating record: {}", id);
        let updated = self.apply(Mutation::Update {
            id: id.to_string(),
            patch,
        })?;
        self.write_through();
        Ok(updated)
    }

    /// Permanently removes a record from whichever collection holds it.
    /// Irreversible.
    pub fn delete(&mut self, id: &str) -> Result<Record> {
        info!("Deleting record: {}", id);
        let removed = self.apply(Mutation::Delete { id: id.to_string() })?;
        self.write_through();
        Ok(removed)
    }

    /// Moves a record from the active collection to the archive.
    ///
    /// All fields are preserved; `updated_at` is deliberately not touched.
    /// Fails with `RecordNotFound` if the record is not currently active.
    pub fn archive(&mut self, id: &str) -> Result<Record> {
        info!("Archiving record: {}", id);
        let archived = self.apply(Mutation::Archive { id: id.to_string() })?;
        self.write_through();
        Ok(archived)
    }

    /// Moves a record from the archive back to the end of the active
    /// collection, preserving all fields.
    ///
    /// Fails with `RecordNotFound` if the record is not currently archived.
    pub fn restore(&mut self, id: &str) -> Result<Record> {
        info!("Restoring record: {}", id);
        let restored = self.apply(Mutation::Restore { id: id.to_string() })?;
        self.write_through();
        Ok(restored)
    }

    /// The single transition function every mutation goes through.
    fn apply(&mut self, mutation: Mutation) -> Result<Record> {
        match mutation {
            Mutation::Create(record) => {
                self.active.push(record);
                Ok(self.active.last().expect("just pushed").clone())
            }
            Mutation::Update { id, patch } => {
                let record = self.find_mut(&id).ok_or_else(|| {
                    error!("Cannot update record {}: not found", id);
                    CardboxError::RecordNotFound { id: id.clone() }
                })?;
                record.merge(patch);
                record.updated_at = Utc::now();
                trace!("Record {} updated", id);
                Ok(record.clone())
            }
            Mutation::Delete { id } => {
                if let Some(index) = self.active.iter().position(|r| r.id == id) {
                    debug!("Removing record {} from active collection", id);
                    return Ok(self.active.remove(index));
                }
                if let Some(index) = self.archived.iter().position(|r| r.id == id) {
                    debug!("Removing record {} from archive", id);
                    return Ok(self.archived.remove(index));
                }
                error!("Cannot delete record {}: not found", id);
                Err(CardboxError::RecordNotFound { id })
            }
            Mutation::Archive { id } => {
                let Some(index) = self.active.iter().position(|r| r.id == id) else {
                    error!("Cannot archive record {}: not in the active collection", id);
                    return Err(CardboxError::RecordNotFound { id });
                };
                let record = self.active.remove(index);
                self.archived.push(record);
                Ok(self.archived.last().expect("just pushed").clone())
            }
            Mutation::Restore { id } => {
                let Some(index) = self.archived.iter().position(|r| r.id == id) else {
                    error!("Cannot restore record {}: not in the archive", id);
                    return Err(CardboxError::RecordNotFound { id });
                };
                let record = self.archived.remove(index);
                self.active.push(record);
                Ok(self.active.last().expect("just pushed").clone())
            }
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Record> {
        let shelf = if self.active.iter().any(|r| r.id == id) {
            Shelf::Active
        } else if self.archived.iter().any(|r| r.id == id) {
            Shelf::Archived
        } else {
            return None;
        };
        match shelf {
            Shelf::Active => self.active.iter_mut().find(|r| r.id == id),
            Shelf::Archived => self.archived.iter_mut().find(|r| r.id == id),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Produces the ordered, filtered view over the active collection.
    ///
    /// Pure with respect to the store: recomputing with identical inputs
    /// yields an identical sequence of references.
    pub fn filtered_view(&self, filter: &FilterConfig, sort: &SortKey) -> Vec<&Record> {
        filtered_view(&self.active, filter, sort)
    }

    /// Distinct tag values and usage counts over the active and archived
    /// collections, alphabetically ordered. Recomputed on every call.
    pub fn facets(&self) -> Vec<FacetCount> {
        facets(self.active.iter().chain(self.archived.iter()))
    }

    /// Fuzzy relevance search over the active collection.
    pub fn ranked_search(&self, query: &str, limit: usize) -> Vec<&Record> {
        ranked_search(&self.active, query, limit)
    }

    // ------------------------------------------------------------------
    // Deferred operations
    // ------------------------------------------------------------------

    /// Issues a generation stamp for an operation whose result will arrive
    /// later (a simulated network call, a debounced save).
    pub fn stamp(&self) -> OpStamp {
        OpStamp(self.generation)
    }

    /// Invalidates every outstanding stamp. Call when the context that
    /// initiated pending operations is dismissed.
    pub fn invalidate_deferred(&mut self) {
        self.generation += 1;
        debug!("Deferred generation advanced to {}", self.generation);
    }

    /// Runs a deferred operation only if its stamp is still current;
    /// otherwise discards it silently.
    pub fn apply_if_current<T>(
        &mut self,
        stamp: OpStamp,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Deferred<T>> {
        if stamp.0 != self.generation {
            debug!(
                "Discarding stale deferred operation (stamp {} vs generation {})",
                stamp.0, self.generation
            );
            return Ok(Deferred::Discarded);
        }
        op(self).map(Deferred::Applied)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Whether the last write-through attempt failed, and how.
    ///
    /// The in-memory store stays authoritative after a failed write; this is
    /// surfaced so a UI can show a non-fatal warning.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Writes the current snapshot to disk, surfacing any failure.
    pub fn persist(&self) -> Result<()> {
        let path = self.config.snapshot_path();
        debug!("Persisting snapshot to {}", path.display());

        // The data directory can disappear out from under a long session
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| CardboxError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }

        self.snapshot().write_atomic(&path)?;

        if self.config.backup_on_save {
            match self.create_backup() {
                Ok(backup_path) => trace!("Backup created at {}", backup_path.display()),
                Err(e) => warn!("Failed to create backup: {}", e),
            }
        }
        Ok(())
    }

    /// Builds the serializable snapshot of the whole store.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_seq: self.next_seq,
            records: self.active.clone(),
            archived: self.archived.clone(),
        }
    }

    /// Best-effort write after a mutation. Failures are logged and retained,
    /// never propagated: memory is authoritative for the session.
    fn write_through(&mut self) {
        if !self.config.write_through {
            return;
        }
        match self.persist() {
            Ok(()) => {
                self.last_persist_error = None;
            }
            Err(e) => {
                warn!("Write-through persistence failed: {}", e);
                self.last_persist_error = Some(e.to_string());
            }
        }
    }

    // ------------------------------------------------------------------
    // Backups
    // ------------------------------------------------------------------

    /// Copies the current snapshot into the backup directory and prunes the
    /// oldest copies beyond `max_backups`.
    ///
    /// # Returns
    ///
    /// The path to the created backup file in case of success or an error
    pub fn create_backup(&self) -> Result<PathBuf> {
        // Ensure backup directory exists
        if !self.config.backup_dir.exists() {
            debug!(
                "Creating backup directory: {}",
                self.config.backup_dir.display()
            );
            fs::create_dir_all(&self.config.backup_dir).map_err(|e| {
                error!("Failed to create backup directory: {}", e);
                CardboxError::Io(e)
            })?;
        }

        // Pick a timestamped path, bumping on the rare same-instant collision
        let mut stamp = Utc::now().timestamp_micros();
        let mut backup_path = self.backup_path_for(stamp);
        while backup_path.exists() {
            stamp += 1;
            backup_path = self.backup_path_for(stamp);
        }

        let json = self.snapshot().to_json()?;
        fs::write(&backup_path, json).map_err(|e| {
            error!("Failed to write backup file {}: {}", backup_path.display(), e);
            CardboxError::Io(e)
        })?;
        info!("Backup created at: {}", backup_path.display());

        self.prune_backups();
        Ok(backup_path)
    }

    /// Replaces the in-memory state from the most recent backup file.
    ///
    /// The id sequence never moves backwards, so ids issued since the backup
    /// was taken stay retired. The restored state is written through.
    pub fn restore_latest_backup(&mut self) -> Result<RestoreSummary> {
        let Some(backup_file) = self.list_backups().into_iter().next_back() else {
            let message = format!("No backups found for namespace {}", self.config.namespace);
            error!("{}", message);
            return Err(CardboxError::BackupFailed { message });
        };

        info!("Restoring from backup: {}", backup_file.display());
        let snapshot =
            Snapshot::load(&backup_file).map_err(|e| CardboxError::BackupFailed {
                message: format!("Failed to load backup {}: {}", backup_file.display(), e),
            })?;

        self.active = snapshot.records;
        self.archived = snapshot.archived;
        self.next_seq = self.next_seq.max(snapshot.next_seq);
        self.write_through();

        Ok(RestoreSummary {
            backup_file,
            records_restored: self.active.len(),
            archived_restored: self.archived.len(),
        })
    }

    fn backup_path_for(&self, stamp: i64) -> PathBuf {
        self.config
            .backup_dir
            .join(format!("{}-{}.json", self.config.namespace, stamp))
    }

    /// Backup files for this namespace, oldest first.
    fn list_backups(&self) -> Vec<PathBuf> {
        let prefix = format!("{}-", self.config.namespace);
        let mut backups: Vec<(i64, PathBuf)> = WalkDir::new(&self.config.backup_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
            })
            .filter_map(|entry| {
                let path = entry.path().to_path_buf();
                let stem = path.file_stem()?.to_string_lossy().to_string();
                let stamp: i64 = stem.strip_prefix(&prefix)?.parse().ok()?;
                Some((stamp, path))
            })
            .collect();
        backups.sort_by_key(|(stamp, _)| *stamp);
        backups.into_iter().map(|(_, path)| path).collect()
    }

    fn prune_backups(&self) {
        let backups = self.list_backups();
        let keep = self.config.max_backups as usize;
        if backups.len() <= keep {
            return;
        }
        let excess = backups.len() - keep;
        for path in backups.into_iter().take(excess) {
            debug!("Pruning old backup: {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to prune backup {}: {}", path.display(), e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Serializes the active collection to a dated JSON document in `dir`.
    ///
    /// This is a one-way export; there is no corresponding import path.
    pub fn export_active(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|_| CardboxError::DirectoryError {
                path: dir.to_path_buf(),
            })?;
        }

        let filename = format!(
            "{}-export-{}.json",
            self.config.namespace,
            Utc::now().format("%Y-%m-%d")
        );
        let path = dir.join(filename);

        let json = serde_json::to_string_pretty(&self.active)?;
        fs::write(&path, json)?;

        info!(
            "Exported {} records to {}",
            self.active.len(),
            path.display()
        );
        Ok(path)
    }
}
