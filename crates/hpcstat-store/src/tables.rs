//! redb table definitions for the hpcstat status store.
//!
//! Values are JSON-serialized domain types.

use redb::TableDefinition;

/// The current snapshot, stored under [`CURRENT_KEY`].
pub const SNAPSHOT: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");

/// Uptime entries keyed by their position in the log, so a scan returns
/// them in insertion order.
pub const HISTORY: TableDefinition<u64, &[u8]> = TableDefinition::new("history");

pub const CURRENT_KEY: &str = "current";
