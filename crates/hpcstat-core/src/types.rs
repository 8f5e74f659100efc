//! Shared types used across hpcstat crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::HourStamp;

/// Raw result of probing a single named resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Up,
    Down,
    /// The probe could not determine the state (partition probes only).
    Unknown,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Up => "up",
            ResourceStatus::Down => "down",
            ResourceStatus::Unknown => "unknown",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ResourceStatus::Up => "✅",
            ResourceStatus::Down => "❌",
            ResourceStatus::Unknown => "❓",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of a whole resource class.
///
/// Ordered by severity: `Up < Partial < Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CondensedStatus {
    Up,
    Partial,
    Down,
}

impl CondensedStatus {
    /// Combine two observations of the same hour; the more severe one wins.
    pub fn worst(self, other: CondensedStatus) -> CondensedStatus {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CondensedStatus::Up => "up",
            CondensedStatus::Partial => "partial",
            CondensedStatus::Down => "down",
        }
    }
}

impl fmt::Display for CondensedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource name → raw status, for one resource class.
pub type ResourceClassMap = BTreeMap<String, ResourceStatus>;

/// The resource classes hpcstat monitors. The string form is the JSON key
/// used in both persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    LoginNodes,
    SlurmQueues,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 2] = [ResourceClass::LoginNodes, ResourceClass::SlurmQueues];

    pub fn key(&self) -> &'static str {
        match self {
            ResourceClass::LoginNodes => "login_nodes",
            ResourceClass::SlurmQueues => "slurm_queues",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceClass::LoginNodes => "Login Nodes",
            ResourceClass::SlurmQueues => "Job Queues",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Current status of every monitored resource, taken at one hour-aligned instant.
///
/// Serializes as `{"timestamp": ..., "<class>": {<name>: <status>, ...}, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: HourStamp,
    #[serde(flatten)]
    pub classes: BTreeMap<String, ResourceClassMap>,
}

impl Snapshot {
    /// Raw statuses for one class, if that class was probed.
    pub fn class(&self, name: &str) -> Option<&ResourceClassMap> {
        self.classes.get(name)
    }
}

/// One hour of uptime history: the worst condensed status seen per class.
///
/// Serializes as `{"timestamp": ..., "<class>": <condensed>, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeEntry {
    pub timestamp: HourStamp,
    #[serde(flatten)]
    pub classes: BTreeMap<String, CondensedStatus>,
}

impl UptimeEntry {
    pub fn new(timestamp: HourStamp) -> Self {
        Self {
            timestamp,
            classes: BTreeMap::new(),
        }
    }

    pub fn with_class(mut self, name: impl Into<String>, status: CondensedStatus) -> Self {
        self.classes.insert(name.into(), status);
        self
    }

    pub fn status(&self, name: &str) -> Option<CondensedStatus> {
        self.classes.get(name).copied()
    }
}
