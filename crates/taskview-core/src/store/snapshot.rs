//! JSON snapshot file with XDG path support.
//!
//! A snapshot holds tasks, views and positions in one file at
//! `~/.cache/tv/snapshot.json`. It is loaded into a [`MemoryStore`], worked
//! on in memory and written back atomically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::MemoryStore;
use crate::model::{ProjectView, Task};
use crate::position::PositionEntry;

/// Default snapshot filename.
const SNAPSHOT_FILENAME: &str = "snapshot.json";

/// Application qualifier (for XDG paths).
const QUALIFIER: &str = "";

/// Application organization (for XDG paths).
const ORGANIZATION: &str = "";

/// Application name (for XDG paths).
const APPLICATION: &str = "tv";

/// Errors that can occur while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    /// Failed to determine the XDG cache directory.
    #[error("failed to determine cache directory: no valid home directory found")]
    NoCacheDir,

    /// I/O error during file read.
    #[error("failed to read snapshot file '{path}': {source}")]
    ReadError {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during file write.
    #[error("failed to write snapshot file '{path}': {source}")]
    WriteError {
        /// The path that failed to write.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during directory creation.
    #[error("failed to create snapshot directory '{path}': {source}")]
    CreateDirError {
        /// The directory path that failed to create.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, SnapshotStoreError>;

/// Serialized contents of a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All tasks.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// All project views.
    #[serde(default)]
    pub views: Vec<ProjectView>,
    /// All position entries.
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
}

impl Snapshot {
    /// Builds the in-memory tables for this snapshot.
    pub fn into_memory(self) -> MemoryStore {
        let mut store = MemoryStore::new();
        for task in self.tasks {
            store.insert_task(task);
        }
        for view in self.views {
            store.insert_view(view);
        }
        for entry in self.positions {
            store.put_position(entry);
        }
        store
    }

    /// Captures the current contents of a memory store.
    pub fn from_memory(store: &MemoryStore) -> Self {
        Self {
            tasks: store.tasks().cloned().collect(),
            views: store.views().cloned().collect(),
            positions: store.positions(),
        }
    }
}

/// Persistent storage for a snapshot file.
///
/// # Example
///
/// ```no_run
/// use taskview_core::store::SnapshotStore;
///
/// let file = SnapshotStore::new()?;
/// let store = file.load_or_default()?;
/// // ... work on the memory store ...
/// file.save(&store)?;
/// # Ok::<(), taskview_core::store::SnapshotStoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Path to the snapshot file.
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store at the default XDG cache path.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotStoreError::NoCacheDir` if the home directory cannot
    /// be determined.
    pub fn new() -> Result<Self> {
        let path = Self::default_path()?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default XDG cache path for the snapshot file.
    ///
    /// On Unix: `~/.cache/tv/snapshot.json`
    ///
    /// # Errors
    ///
    /// Returns `SnapshotStoreError::NoCacheDir` if the home directory cannot
    /// be determined.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or(SnapshotStoreError::NoCacheDir)?;
        Ok(project_dirs.cache_dir().join(SNAPSHOT_FILENAME))
    }

    /// Returns the path to the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the snapshot file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the snapshot file.
    ///
    /// # Errors
    ///
    /// - Returns `SnapshotStoreError::ReadError` if the file cannot be read.
    /// - Returns `SnapshotStoreError::Json` if the file contains invalid JSON.
    pub fn read(&self) -> Result<Snapshot> {
        let contents =
            fs::read_to_string(&self.path).map_err(|e| SnapshotStoreError::ReadError {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads the snapshot into a memory store.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub fn load(&self) -> Result<MemoryStore> {
        let snapshot = self.read()?;
        debug!(
            path = %self.path.display(),
            tasks = snapshot.tasks.len(),
            views = snapshot.views.len(),
            positions = snapshot.positions.len(),
            "loaded snapshot"
        );
        Ok(snapshot.into_memory())
    }

    /// Loads the snapshot, returning an empty store if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// - Returns `SnapshotStoreError::ReadError` for I/O errors other than
    ///   "file not found".
    /// - Returns `SnapshotStoreError::Json` if the file contains invalid JSON.
    pub fn load_or_default(&self) -> Result<MemoryStore> {
        match self.load() {
            Ok(store) => Ok(store),
            Err(SnapshotStoreError::ReadError { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Ok(MemoryStore::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the store's contents to disk atomically.
    ///
    /// Creates the parent directory if needed and writes through a temporary
    /// file that is renamed into place.
    ///
    /// # Errors
    ///
    /// - Returns `SnapshotStoreError::CreateDirError` if the directory cannot be created.
    /// - Returns `SnapshotStoreError::WriteError` if the file cannot be written.
    /// - Returns `SnapshotStoreError::Json` if serialization fails.
    pub fn save(&self, store: &MemoryStore) -> Result<()> {
        self.write(&Snapshot::from_memory(store))
    }

    /// Writes a snapshot to disk atomically.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SnapshotStoreError::CreateDirError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json).map_err(|e| SnapshotStoreError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| SnapshotStoreError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), "saved snapshot");
        Ok(())
    }
}
