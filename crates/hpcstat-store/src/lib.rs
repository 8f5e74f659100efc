//! hpcstat-store — persistence for the current snapshot and uptime history.
//!
//! All backends implement [`StatusStore`], a narrow load/save contract over
//! the two documents hpcstat owns:
//!
//! - the current snapshot, overwritten wholesale on every run
//! - the uptime log, loaded, merged, pruned and written back
//!
//! # Backends
//!
//! ```text
//! StatusStore
//!   ├── JsonFileStore  two JSON documents, atomic rename-on-write
//!   ├── RedbStore      embedded redb database, one transaction per run
//!   ├── RedbFileStore  RedbStore opened per operation, for the CLI
//!   └── MemoryStore    in-process, for tests
//! ```

pub mod error;
pub mod json;
pub mod memory;
pub mod store;
pub mod tables;

use chrono::NaiveDateTime;
use hpcstat_core::{condense_all, Snapshot, UptimeLog};

pub use error::{StoreError, StoreResult};
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{RedbFileStore, RedbStore};

/// Load/save contract for hpcstat's persisted state.
pub trait StatusStore: Send + Sync {
    /// The last snapshot written, if any.
    fn load_snapshot(&self) -> StoreResult<Option<Snapshot>>;

    /// Replace the current snapshot.
    fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()>;

    /// The stored uptime log, in insertion order; empty when nothing has
    /// been stored yet.
    fn load_history(&self) -> StoreResult<UptimeLog>;

    /// Replace the stored uptime log.
    fn save_history(&self, log: &UptimeLog) -> StoreResult<()>;

    /// Persist one run: condense `snapshot`, merge it into the stored
    /// history, prune against `now`, then write both documents.
    ///
    /// History is loaded before anything is written, so an unreadable
    /// history aborts the run with the previous snapshot intact. History is
    /// also written first: a failed history write never leaves the new
    /// snapshot next to stale history.
    fn record(&self, snapshot: &Snapshot, now: NaiveDateTime) -> StoreResult<UptimeLog> {
        let mut history = self.load_history()?;
        history.record(condense_all(snapshot), now);
        self.save_history(&history)?;
        self.save_snapshot(snapshot)?;
        Ok(history)
    }
}
