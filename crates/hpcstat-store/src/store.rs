//! RedbStore — redb-backed status persistence.
//!
//! The snapshot is a single JSON value; the uptime log is one row per entry
//! keyed by its position, so reads return insertion order. A whole run
//! (load, merge, prune, write) happens inside one write transaction. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).
//!
//! redb holds an exclusive lock on the file for as long as the
//! [`Database`] is open. [`RedbFileStore`] opens it per operation so that
//! `hpcstat show` can read while `hpcstat watch` sleeps between runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use hpcstat_core::{condense_all, Snapshot, UptimeEntry, UptimeLog};
use redb::{Database, DatabaseError, ReadableDatabase, ReadableTable, Table};
use tracing::debug;

use crate::StatusStore;
use crate::error::{StoreError, StoreResult};
use crate::tables::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

const IN_MEMORY: &str = ":memory:";

fn open_error(path: &Path) -> impl FnOnce(DatabaseError) -> StoreError + '_ {
    move |e| match e {
        DatabaseError::DatabaseAlreadyOpen => StoreError::Locked {
            path: path.to_path_buf(),
        },
        e => StoreError::Open(e.to_string()),
    }
}

fn corrupt(
    path: &Path,
    key: impl ToString,
    source: impl std::error::Error + Send + Sync + 'static,
) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        key: Some(key.to_string()),
        source: Box::new(source),
    }
}

/// Thread-safe status store backed by redb.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(StoreError::io(dir))?;
        }
        let db = Database::create(path).map_err(open_error(path))?;
        let store = Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        };
        store.ensure_tables()?;
        debug!(?path, "status store opened");
        Ok(store)
    }

    /// Open a store that already exists, creating nothing.
    pub fn open_existing(path: &Path) -> StoreResult<Self> {
        let db = Database::open(path).map_err(open_error(path))?;
        debug!(?path, "status store opened for reading");
        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            path: PathBuf::from(IN_MEMORY),
        };
        store.ensure_tables()?;
        debug!("in-memory status store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(SNAPSHOT).map_err(map_err!(Table))?;
        txn.open_table(HISTORY).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Read every history row in log order.
    fn read_history(&self, table: &impl ReadableTable<u64, &'static [u8]>) -> StoreResult<UptimeLog> {
        let mut entries = Vec::new();
        for row in table.iter().map_err(map_err!(Read))? {
            let (key, value) = row.map_err(map_err!(Read))?;
            let entry: UptimeEntry = serde_json::from_slice(value.value())
                .map_err(|e| corrupt(&self.path, key.value(), e))?;
            entries.push(entry);
        }
        Ok(UptimeLog::from_entries(entries))
    }
}

/// Replace every history row with the contents of `log`.
fn write_history(table: &mut Table<'_, u64, &'static [u8]>, log: &UptimeLog) -> StoreResult<()> {
    table.retain(|_, _| false).map_err(map_err!(Write))?;
    for (position, entry) in (0u64..).zip(log.entries()) {
        let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
        table
            .insert(position, value.as_slice())
            .map_err(map_err!(Write))?;
    }
    Ok(())
}

fn write_snapshot(table: &mut Table<'_, &'static str, &'static [u8]>, snapshot: &Snapshot) -> StoreResult<()> {
    let value = serde_json::to_vec(snapshot).map_err(map_err!(Serialize))?;
    table
        .insert(CURRENT_KEY, value.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

impl StatusStore for RedbStore {
    fn load_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SNAPSHOT).map_err(map_err!(Table))?;
        match table.get(CURRENT_KEY).map_err(map_err!(Read))? {
            Some(guard) => {
                let snapshot: Snapshot = serde_json::from_slice(guard.value())
                    .map_err(|e| corrupt(&self.path, CURRENT_KEY, e))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SNAPSHOT).map_err(map_err!(Table))?;
            write_snapshot(&mut table, snapshot)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(timestamp = %snapshot.timestamp, "snapshot stored");
        Ok(())
    }

    fn load_history(&self) -> StoreResult<UptimeLog> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
        self.read_history(&table)
    }

    fn save_history(&self, log: &UptimeLog) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
            write_history(&mut table, log)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(entries = log.len(), "history stored");
        Ok(())
    }

    fn record(&self, snapshot: &Snapshot, now: NaiveDateTime) -> StoreResult<UptimeLog> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let history = {
            let mut history_table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
            let mut history = self.read_history(&history_table)?;
            history.record(condense_all(snapshot), now);
            write_history(&mut history_table, &history)?;

            let mut snapshot_table = txn.open_table(SNAPSHOT).map_err(map_err!(Table))?;
            write_snapshot(&mut snapshot_table, snapshot)?;
            history
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(timestamp = %snapshot.timestamp, entries = history.len(), "run recorded");
        Ok(history)
    }
}

/// redb file opened for the duration of each operation.
///
/// Reads never create the database: a missing file reads as empty. A file
/// held open by another process fails with [`StoreError::Locked`].
#[derive(Debug, Clone)]
pub struct RedbFileStore {
    path: PathBuf,
}

impl RedbFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_read(&self) -> StoreResult<Option<RedbStore>> {
        if !self.path.exists() {
            debug!(path = ?self.path, "database not found");
            return Ok(None);
        }
        RedbStore::open_existing(&self.path).map(Some)
    }
}

impl StatusStore for RedbFileStore {
    fn load_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        match self.open_for_read()? {
            Some(store) => store.load_snapshot(),
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        RedbStore::open(&self.path)?.save_snapshot(snapshot)
    }

    fn load_history(&self) -> StoreResult<UptimeLog> {
        match self.open_for_read()? {
            Some(store) => store.load_history(),
            None => Ok(UptimeLog::new()),
        }
    }

    fn save_history(&self, log: &UptimeLog) -> StoreResult<()> {
        RedbStore::open(&self.path)?.save_history(log)
    }

    fn record(&self, snapshot: &Snapshot, now: NaiveDateTime) -> StoreResult<UptimeLog> {
        RedbStore::open(&self.path)?.record(snapshot, now)
    }
}
