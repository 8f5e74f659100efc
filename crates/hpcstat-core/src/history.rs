//! Uptime history — one entry per hour, worst status wins, 24h retention.
//!
//! The log is append-only in the common case: a run in a new hour appends an
//! entry. A second run in the same hour folds its observation into the
//! existing entry, which can only move toward `down`. Pruning runs after
//! every merge and drops entries older than [`RETENTION`](crate::time::RETENTION).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::{retention_cutoff, HourStamp};
use crate::types::UptimeEntry;

/// Insertion-ordered uptime entries, at most one per hour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UptimeLog {
    entries: Vec<UptimeEntry>,
}

/// What a merge did with the new observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First observation for this hour.
    Appended,
    /// Folded into the existing entry for this hour.
    Combined,
}

impl UptimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored entries, collapsing duplicate hours.
    ///
    /// Stored documents written by this crate never contain duplicates, but
    /// hand-edited or legacy files might; duplicates are merged worst-wins.
    pub fn from_entries(entries: impl IntoIterator<Item = UptimeEntry>) -> Self {
        let mut log = Self::new();
        for entry in entries {
            log.insert(entry);
        }
        log
    }

    pub fn entries(&self) -> &[UptimeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<UptimeEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, timestamp: HourStamp) -> Option<&UptimeEntry> {
        self.entries.iter().find(|e| e.timestamp == timestamp)
    }

    /// Fold one observation into the log without pruning.
    pub fn insert(&mut self, entry: UptimeEntry) -> MergeOutcome {
        match self.entries.iter_mut().find(|e| e.timestamp == entry.timestamp) {
            Some(existing) => {
                for (class, status) in entry.classes {
                    existing
                        .classes
                        .entry(class)
                        .and_modify(|s| *s = s.worst(status))
                        .or_insert(status);
                }
                MergeOutcome::Combined
            }
            None => {
                self.entries.push(entry);
                MergeOutcome::Appended
            }
        }
    }

    /// Drop entries older than the retention window ending at `now`.
    ///
    /// An entry exactly at the cutoff is kept. Returns the number removed.
    pub fn prune(&mut self, now: NaiveDateTime) -> usize {
        let cutoff = retention_cutoff(now);
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp.as_naive() >= cutoff);
        before - self.entries.len()
    }

    /// Insert `entry`, then prune against `now`.
    pub fn record(&mut self, entry: UptimeEntry, now: NaiveDateTime) -> MergeOutcome {
        let timestamp = entry.timestamp;
        let outcome = self.insert(entry);
        let pruned = self.prune(now);
        debug!(%timestamp, ?outcome, pruned, retained = self.entries.len(), "uptime history merged");
        outcome
    }
}

/// Merge `entry` into `log` and prune to the retention window ending at `now`.
pub fn merge(mut log: UptimeLog, entry: UptimeEntry, now: NaiveDateTime) -> UptimeLog {
    log.record(entry, now);
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CondensedStatus::{self, *};

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn entry(ts: &str, login: CondensedStatus, queues: CondensedStatus) -> UptimeEntry {
        UptimeEntry::new(HourStamp::from(dt(ts)))
            .with_class("login_nodes", login)
            .with_class("slurm_queues", queues)
    }

    #[test]
    fn appends_new_hours_in_order() {
        let mut log = UptimeLog::new();
        for ts in ["2024-05-01T10:00:00", "2024-05-01T11:00:00", "2024-05-01T12:00:00"] {
            log = merge(log, entry(ts, Up, Up), dt(ts));
        }

        assert_eq!(log.len(), 3);
        let stamps: Vec<String> = log.entries().iter().map(|e| e.timestamp.to_string()).collect();
        assert_eq!(
            stamps,
            ["2024-05-01T10:00:00", "2024-05-01T11:00:00", "2024-05-01T12:00:00"]
        );
        assert!(log.entries().iter().all(|e| e.status("login_nodes") == Some(Up)));
    }

    #[test]
    fn same_hour_up_then_down_is_down() {
        let now = dt("2024-05-01T10:05:00");
        let log = merge(UptimeLog::new(), entry("2024-05-01T10:05:00", Up, Up), now);
        let log = merge(log, entry("2024-05-01T10:35:00", Down, Up), dt("2024-05-01T10:35:00"));

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].status("login_nodes"), Some(Down));
        assert_eq!(log.entries()[0].status("slurm_queues"), Some(Up));
    }

    #[test]
    fn same_hour_partial_then_up_stays_partial() {
        let log = merge(
            UptimeLog::new(),
            entry("2024-05-01T10:00:00", Partial, Up),
            dt("2024-05-01T10:00:00"),
        );
        let log = merge(log, entry("2024-05-01T10:50:00", Up, Up), dt("2024-05-01T10:50:00"));

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].status("login_nodes"), Some(Partial));
    }

    #[test]
    fn down_hour_not_healed_by_later_run() {
        let mut log = UptimeLog::new();
        assert_eq!(
            log.record(entry("2024-05-01T10:10:00", Down, Up), dt("2024-05-01T10:10:00")),
            MergeOutcome::Appended
        );
        assert_eq!(
            log.record(entry("2024-05-01T10:40:00", Up, Up), dt("2024-05-01T10:40:00")),
            MergeOutcome::Combined
        );
        assert_eq!(log.entries()[0].status("login_nodes"), Some(Down));
    }

    #[test]
    fn combine_keeps_classes_from_either_side() {
        let mut log = UptimeLog::new();
        let ts = HourStamp::from(dt("2024-05-01T10:00:00"));
        log.insert(UptimeEntry::new(ts).with_class("login_nodes", Partial));
        log.insert(UptimeEntry::new(ts).with_class("slurm_queues", Down));

        let merged = log.get(ts).unwrap();
        assert_eq!(merged.status("login_nodes"), Some(Partial));
        assert_eq!(merged.status("slurm_queues"), Some(Down));
    }

    #[test]
    fn prune_boundary_is_inclusive() {
        let now = dt("2024-05-02T12:00:00");
        let mut log = UptimeLog::new();
        log.insert(entry("2024-05-01T12:00:00", Up, Up));
        log.insert(entry("2024-05-01T13:00:00", Up, Up));

        assert_eq!(log.prune(now), 0);
        assert_eq!(log.len(), 2);

        // One second later the oldest entry is 24h + 1s old.
        assert_eq!(log.prune(dt("2024-05-02T12:00:01")), 1);
        assert_eq!(log.entries()[0].timestamp.to_string(), "2024-05-01T13:00:00");
    }

    #[test]
    fn prune_runs_even_when_merging_into_existing_hour() {
        let mut log = UptimeLog::new();
        log.insert(entry("2024-05-01T08:00:00", Up, Up));
        log.insert(entry("2024-05-02T09:00:00", Up, Up));

        let outcome = log.record(entry("2024-05-02T09:30:00", Partial, Up), dt("2024-05-02T09:30:00"));
        assert_eq!(outcome, MergeOutcome::Combined);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].status("login_nodes"), Some(Partial));
    }

    #[test]
    fn window_holds_at_most_a_day() {
        let mut log = UptimeLog::new();
        let start = dt("2024-05-01T00:00:00");
        for h in 0..48 {
            let now = start + chrono::TimeDelta::hours(h);
            log.record(UptimeEntry::new(HourStamp::from(now)).with_class("login_nodes", Up), now);
        }
        // 24 previous hours plus the current one.
        assert_eq!(log.len(), 25);
    }

    #[test]
    fn from_entries_collapses_duplicates() {
        let log = UptimeLog::from_entries([
            entry("2024-05-01T10:00:00", Up, Up),
            entry("2024-05-01T11:00:00", Up, Up),
            entry("2024-05-01T10:00:00", Up, Down),
        ]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].status("slurm_queues"), Some(Down));
    }

    #[test]
    fn serializes_as_plain_array() {
        let log = UptimeLog::from_entries([entry("2024-05-01T10:00:00", Up, Partial)]);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"timestamp": "2024-05-01T10:00:00", "login_nodes": "up", "slurm_queues": "partial"}
            ])
        );
    }
}
