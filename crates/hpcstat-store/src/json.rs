//! JsonFileStore — the two status documents as plain JSON files.
//!
//! Writes go to a temporary file in the target's directory which is then
//! renamed over the target, so readers never observe a half-written
//! document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use hpcstat_core::{Snapshot, UptimeEntry, UptimeLog};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::StatusStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    status_path: PathBuf,
    history_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(status_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            status_path: status_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }
}

impl StatusStore for JsonFileStore {
    fn load_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        read_document(&self.status_path)
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        write_document(&self.status_path, snapshot)?;
        debug!(path = ?self.status_path, timestamp = %snapshot.timestamp, "snapshot written");
        Ok(())
    }

    fn load_history(&self) -> StoreResult<UptimeLog> {
        let entries: Option<Vec<UptimeEntry>> = read_document(&self.history_path)?;
        Ok(entries.map(UptimeLog::from_entries).unwrap_or_default())
    }

    fn save_history(&self, log: &UptimeLog) -> StoreResult<()> {
        write_document(&self.history_path, log)?;
        debug!(path = ?self.history_path, entries = log.len(), "history written");
        Ok(())
    }
}

/// Read and parse a JSON document. A missing file is `None`; anything that
/// exists but does not parse is [`StoreError::Corrupt`].
fn read_document<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "document not found");
            return Ok(None);
        }
        Err(e) => return Err(StoreError::io(path)(e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            key: None,
            source: Box::new(source),
        })
}

fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(StoreError::io(dir))?;

    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(StoreError::io(dir))?;
    tmp.write_all(&bytes).map_err(StoreError::io(tmp.path()))?;
    tmp.as_file().sync_all().map_err(StoreError::io(tmp.path()))?;
    tmp.persist(path).map_err(|e| StoreError::io(path)(e.error))?;
    Ok(())
}
