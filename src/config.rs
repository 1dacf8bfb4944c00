use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Store configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory where the snapshot file lives
    pub data_dir: PathBuf,

    /// Directory for snapshot backups
    pub backup_dir: PathBuf,

    /// Namespace keying this store's snapshot within the data directory
    pub namespace: String,

    /// Whether every mutation writes the snapshot through to disk
    pub write_through: bool,

    /// Whether each successful persistence write also drops a backup copy
    pub backup_on_save: bool,

    /// Maximum number of backups to keep
    pub max_backups: u32,
}

impl Config {
    /// Builds a configuration rooted in the platform data directory.
    ///
    /// Falls back to the current directory when no platform directory can be
    /// determined (some minimal containers).
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        let base = ProjectDirs::from("", "", "cardbox")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(&base, namespace)
    }

    /// Builds a configuration rooted in an explicit directory.
    pub fn in_dir(dir: &Path, namespace: impl Into<String>) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            backup_dir: dir.join("backups"),
            namespace: namespace.into(),
            write_through: true,
            backup_on_save: false,
            max_backups: 5,
        }
    }

    /// Path of the snapshot file for this namespace.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path_is_namespaced() {
        let config = Config::in_dir(Path::new("/tmp/data"), "notes");
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/data/notes.json"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::in_dir(Path::new("/tmp/data"), "notes");
        assert!(config.write_through);
        assert!(!config.backup_on_save);
        assert_eq!(config.max_backups, 5);
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/data/backups"));
    }
}
