//! Status aggregation — reduce per-resource results to one class status.

use crate::types::{CondensedStatus, ResourceClassMap, ResourceStatus, Snapshot, UptimeEntry};

/// Condense the raw statuses of one resource class.
///
/// All `up` gives `up`, all `down` gives `down`, anything else (including
/// any `unknown`) gives `partial`. The all-`up` rule is checked first, so an
/// empty class is vacuously `up`.
pub fn condense(map: &ResourceClassMap) -> CondensedStatus {
    if map.values().all(|s| *s == ResourceStatus::Up) {
        CondensedStatus::Up
    } else if map.values().all(|s| *s == ResourceStatus::Down) {
        CondensedStatus::Down
    } else {
        CondensedStatus::Partial
    }
}

/// Condense every class of a snapshot into an uptime entry for its hour.
pub fn condense_all(snapshot: &Snapshot) -> UptimeEntry {
    let classes = snapshot
        .classes
        .iter()
        .map(|(name, map)| (name.clone(), condense(map)))
        .collect();

    UptimeEntry {
        timestamp: snapshot.timestamp,
        classes,
    }
}
