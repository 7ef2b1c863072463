//! # Persistence Filter & Snapshot Stores
//!
//! Only a [`PersistenceSnapshot`] ever reaches durable storage: the data
//! record with every file-upload field removed. A snapshot can only be
//! built through [`persistence_snapshot`], so it never holds a file
//! reference.
//!
//! [`SnapshotWriter`] decides when to write:
//!
//! 1. never on the first render (the initial record would overwrite what
//!    was stored with an empty snapshot),
//! 2. never when no field carries an answer,
//! 3. never when the snapshot equals the last one written.
//!
//! Stores are key-value collaborators behind [`SnapshotStore`]. A failed
//! write is the caller's to log; it never blocks an edit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use formflow_core::{DataRecord, FormSchema, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version tag written into stored snapshots.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Errors from a snapshot store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage key cannot be used as a file name.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    /// Stored data was written by an unknown format version.
    #[error("unsupported snapshot version {found}")]
    UnsupportedVersion {
        /// Version found in storage.
        found: u32,
    },

    /// Filesystem failure.
    #[error("io error on '{path}': {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A data record with all file-bearing fields removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PersistenceSnapshot {
    record: DataRecord,
}

impl PersistenceSnapshot {
    /// The filtered record.
    pub fn record(&self) -> &DataRecord {
        &self.record
    }

    /// Consume into the filtered record.
    pub fn into_record(self) -> DataRecord {
        self.record
    }

    /// Whether at least one field carries an answer.
    pub fn has_content(&self) -> bool {
        self.record.has_content()
    }
}

/// Build the storage-safe projection of `record`.
///
/// Drops every field whose question is a file upload, and any other value
/// that holds file references.
pub fn persistence_snapshot(schema: &FormSchema, record: &DataRecord) -> PersistenceSnapshot {
    let mut filtered = record.clone();
    filtered.retain(|id, value| {
        let file_question = schema
            .kind_of(id.as_str())
            .is_some_and(|kind| kind.holds_files());
        !file_question && !value.holds_files()
    });
    PersistenceSnapshot { record: filtered }
}

/// Outcome of one [`SnapshotWriter::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot was saved.
    Written,
    /// First observation of the session; nothing saved.
    SkippedFirstRender,
    /// No field carries an answer; nothing saved.
    SkippedEmpty,
    /// Same as the last saved snapshot; nothing saved.
    SkippedUnchanged,
}

/// Write policy for snapshots.
#[derive(Debug, Default)]
pub struct SnapshotWriter {
    rendered: bool,
    last_written: Option<PersistenceSnapshot>,
}

impl SnapshotWriter {
    /// A writer that has not observed any record yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a record and save its snapshot if the policy allows.
    ///
    /// On a store failure the last-written snapshot is left unchanged so
    /// the next change retries.
    pub fn write(
        &mut self,
        schema: &FormSchema,
        record: &DataRecord,
        store: &dyn SnapshotStore,
        key: &str,
    ) -> Result<WriteOutcome, StoreError> {
        if !self.rendered {
            self.rendered = true;
            return Ok(WriteOutcome::SkippedFirstRender);
        }
        let snapshot = persistence_snapshot(schema, record);
        if !snapshot.has_content() {
            return Ok(WriteOutcome::SkippedEmpty);
        }
        if self.last_written.as_ref() == Some(&snapshot) {
            return Ok(WriteOutcome::SkippedUnchanged);
        }
        store.save(key, &snapshot)?;
        tracing::debug!(key, fields = snapshot.record().len(), "snapshot written");
        self.last_written = Some(snapshot);
        Ok(WriteOutcome::Written)
    }

    /// Forget the last written snapshot, e.g. after the store was cleared.
    pub fn forget(&mut self) {
        self.last_written = None;
    }

    /// The last snapshot saved.
    pub fn last_written(&self) -> Option<&PersistenceSnapshot> {
        self.last_written.as_ref()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    version: u32,
    saved_at: Timestamp,
    form_data: DataRecord,
}

fn encode(snapshot: &PersistenceSnapshot) -> Result<String, StoreError> {
    let stored = StoredSnapshot {
        version: SNAPSHOT_FORMAT_VERSION,
        saved_at: Timestamp::now(),
        form_data: snapshot.record().clone(),
    };
    Ok(serde_json::to_string_pretty(&stored)?)
}

fn decode(text: &str) -> Result<DataRecord, StoreError> {
    let stored: StoredSnapshot = serde_json::from_str(text)?;
    if stored.version != SNAPSHOT_FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: stored.version,
        });
    }
    Ok(stored.form_data)
}

/// Key-value persistence collaborator.
///
/// `load` returns the raw stored record; callers re-filter it against the
/// schema before use.
pub trait SnapshotStore: Send + Sync {
    /// Read the record stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<DataRecord>, StoreError>;

    /// Replace whatever is stored under `key`.
    fn save(&self, key: &str, snapshot: &PersistenceSnapshot) -> Result<(), StoreError>;

    /// Remove whatever is stored under `key`.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store keeping the serialized text, as a browser store would.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialized text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Store raw text under `key`, bypassing the filter.
    pub fn put_raw(&self, key: &str, text: impl Into<String>) {
        self.entries.lock().insert(key.to_string(), text.into());
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<DataRecord>, StoreError> {
        self.entries.lock().get(key).map(|text| decode(text)).transpose()
    }

    fn save(&self, key: &str, snapshot: &PersistenceSnapshot) -> Result<(), StoreError> {
        let text = encode(snapshot)?;
        self.entries.lock().insert(key.to_string(), text);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let usable = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !usable {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<DataRecord>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => decode(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn save(&self, key: &str, snapshot: &PersistenceSnapshot) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let text = encode(snapshot)?;
        // Replace atomically.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
