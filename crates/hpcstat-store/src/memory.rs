//! In-memory status store (for testing).

use std::sync::{Mutex, PoisonError};

use hpcstat_core::{Snapshot, UptimeLog};

use crate::StatusStore;
use crate::error::StoreResult;

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
    history: Mutex<UptimeLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing uptime log.
    pub fn with_history(history: UptimeLog) -> Self {
        Self {
            snapshot: Mutex::new(None),
            history: Mutex::new(history),
        }
    }
}

impl StatusStore for MemoryStore {
    fn load_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        Ok(self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }

    fn load_history(&self) -> StoreResult<UptimeLog> {
        Ok(self.history.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_history(&self, log: &UptimeLog) -> StoreResult<()> {
        *self.history.lock().unwrap_or_else(PoisonError::into_inner) = log.clone();
        Ok(())
    }
}
