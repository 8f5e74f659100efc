//! Snapshot assembly.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::time::HourStamp;
use crate::types::{ResourceClass, ResourceClassMap, Snapshot};

/// Collects complete per-class probe results into a [`Snapshot`].
///
/// A class is added only once its map is complete; there is no way to add
/// single resources, so a half-probed class can never be condensed.
#[derive(Debug)]
pub struct SnapshotBuilder {
    timestamp: HourStamp,
    classes: BTreeMap<String, ResourceClassMap>,
}

impl SnapshotBuilder {
    /// Start a snapshot for the hour containing `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            timestamp: HourStamp::from(now),
            classes: BTreeMap::new(),
        }
    }

    /// Add (or replace) the results for one class.
    pub fn class(mut self, name: impl Into<String>, map: ResourceClassMap) -> Self {
        self.classes.insert(name.into(), map);
        self
    }

    pub fn login_nodes(self, map: ResourceClassMap) -> Self {
        self.class(ResourceClass::LoginNodes.key(), map)
    }

    pub fn slurm_queues(self, map: ResourceClassMap) -> Self {
        self.class(ResourceClass::SlurmQueues.key(), map)
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp: self.timestamp,
            classes: self.classes,
        }
    }
}
