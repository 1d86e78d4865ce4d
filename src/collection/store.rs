//! Persistence of the collection snapshot.
//!
//! The snapshot is a single pretty-printed JSON array of
//! [`CollectionRecord`]s. It is read once at the start of a sync and written
//! at every checkpoint and at the end.
//!
//! Entries that do not parse as a record are never dropped: they are held
//! aside and appended unchanged on every save.

use super::models::CollectionRecord;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load/save of the canonical collection snapshot.
pub trait SnapshotStore: Send + Sync {
    /// All stored records. A missing file, or one that is not a JSON array,
    /// yields an empty collection rather than an error.
    fn load(&self) -> Vec<CollectionRecord>;

    /// Replace the stored snapshot with `records`.
    fn save(&self, records: &[CollectionRecord]) -> Result<(), StoreError>;
}

/// One element of the saved array.
#[derive(Serialize)]
#[serde(untagged)]
enum SnapshotEntry<'a> {
    Record(&'a CollectionRecord),
    Kept(&'a Value),
}

/// Snapshot stored as a JSON file.
pub struct JsonSnapshotStore {
    path: PathBuf,
    /// Entries of the last load that are not valid records.
    unreadable: Mutex<Vec<Value>>,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unreadable: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries the last load could not read as records.
    pub fn unreadable_count(&self) -> usize {
        self.unreadable.lock().unwrap().len()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Vec<CollectionRecord> {
        self.unreadable.lock().unwrap().clear();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No existing collection at {:?}, starting empty", self.path);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read collection {:?}: {}, starting empty", self.path, e);
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Malformed collection {:?}: {}, starting empty", self.path, e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        let mut unreadable = Vec::new();
        for (position, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CollectionRecord>(entry.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Record #{} in {:?} is not readable ({}), keeping it as is",
                        position, self.path, e
                    );
                    unreadable.push(entry);
                }
            }
        }

        debug!(
            "Loaded {} records from {:?} ({} kept unread)",
            records.len(),
            self.path,
            unreadable.len()
        );
        *self.unreadable.lock().unwrap() = unreadable;
        records
    }

    /// Written through a temporary file in the same directory, so readers
    /// never observe a half-written snapshot.
    fn save(&self, records: &[CollectionRecord]) -> Result<(), StoreError> {
        let mut json = {
            let unreadable = self.unreadable.lock().unwrap();
            let entries: Vec<SnapshotEntry<'_>> = records
                .iter()
                .map(SnapshotEntry::Record)
                .chain(unreadable.iter().map(SnapshotEntry::Kept))
                .collect();
            serde_json::to_string_pretty(&entries)?
        };
        json.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.flush().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }
}

/// Position of every Discogs-linked record in a loaded snapshot, keyed by
/// release id. Built at the start of a run and never persisted.
#[derive(Debug, Default)]
pub struct SnapshotIndex {
    positions: HashMap<u64, usize>,
}

impl SnapshotIndex {
    /// If the snapshot holds the same release twice, the first record wins.
    pub fn build(records: &[CollectionRecord]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if let Some(release_id) = record.discogs_release_id {
                positions.entry(release_id).or_insert(position);
            }
        }
        Self { positions }
    }

    pub fn get(&self, release_id: u64) -> Option<usize> {
        self.positions.get(&release_id).copied()
    }

    pub fn contains(&self, release_id: u64) -> bool {
        self.positions.contains_key(&release_id)
    }

    pub fn insert(&mut self, release_id: u64, position: usize) {
        self.positions.insert(release_id, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
