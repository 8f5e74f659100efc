//! Status summaries and human-readable report formatting.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::history::UptimeLog;
use crate::types::{CondensedStatus, ResourceClass, ResourceClassMap, ResourceStatus, Snapshot};

/// Headline verdict over a set of raw statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every resource is up.
    Operational,
    /// At least one resource could not be probed.
    Unknown,
    /// Something is down and nothing is unknown.
    Degraded,
}

impl Verdict {
    /// Judge a set of raw statuses. "All up" is checked first, so an empty
    /// set is operational.
    pub fn of<'a>(statuses: impl IntoIterator<Item = &'a ResourceStatus> + Clone) -> Self {
        if statuses.clone().into_iter().all(|s| *s == ResourceStatus::Up) {
            Verdict::Operational
        } else if statuses.into_iter().any(|s| *s == ResourceStatus::Unknown) {
            Verdict::Unknown
        } else {
            Verdict::Degraded
        }
    }

    /// Message for the whole cluster.
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Operational => "All systems are operational",
            Verdict::Unknown => "Some systems have unknown status",
            Verdict::Degraded => "Some systems are unavailable",
        }
    }

    /// Message for a single resource class.
    pub fn class_label(&self) -> &'static str {
        match self {
            Verdict::Operational => "All Operational",
            Verdict::Unknown => "Status Unknown",
            Verdict::Degraded => "Issues Detected",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Verdict::Operational => "✅",
            Verdict::Unknown => "⚠️",
            Verdict::Degraded => "❌",
        }
    }
}

/// Hour counts for one class over the retained history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassUptime {
    pub up_hours: u32,
    pub partial_hours: u32,
    pub down_hours: u32,
}

impl ClassUptime {
    pub fn total_hours(&self) -> u32 {
        self.up_hours + self.partial_hours + self.down_hours
    }

    /// Share of recorded hours that were fully up, in percent. `None` when
    /// no hour has been recorded.
    pub fn percent_up(&self) -> Option<f64> {
        match self.total_hours() {
            0 => None,
            total => Some(f64::from(self.up_hours) * 100.0 / f64::from(total)),
        }
    }

    fn count(&mut self, status: CondensedStatus) {
        match status {
            CondensedStatus::Up => self.up_hours += 1,
            CondensedStatus::Partial => self.partial_hours += 1,
            CondensedStatus::Down => self.down_hours += 1,
        }
    }
}

/// Per-class hour counts over an uptime log.
pub fn uptime_by_class(log: &UptimeLog) -> BTreeMap<String, ClassUptime> {
    let mut stats: BTreeMap<String, ClassUptime> = BTreeMap::new();
    for entry in log.entries() {
        for (class, status) in &entry.classes {
            stats.entry(class.clone()).or_default().count(*status);
        }
    }
    stats
}

/// Everything `hpcstat show` reports, in serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub verdict: Verdict,
    pub message: &'static str,
    pub snapshot: Option<Snapshot>,
    pub classes: BTreeMap<String, Verdict>,
    pub uptime: BTreeMap<String, ClassUptime>,
}

impl StatusReport {
    pub fn new(snapshot: Option<Snapshot>, history: &UptimeLog) -> Self {
        let classes: BTreeMap<String, Verdict> = snapshot
            .iter()
            .flat_map(|s| s.classes.iter())
            .map(|(name, map)| (name.clone(), Verdict::of(map.values())))
            .collect();

        let verdict = match &snapshot {
            Some(s) => Verdict::of(s.classes.values().flat_map(ResourceClassMap::values)),
            None => Verdict::Unknown,
        };

        Self {
            verdict,
            message: verdict.message(),
            snapshot,
            classes,
            uptime: uptime_by_class(history),
        }
    }
}

fn class_label(key: &str) -> &str {
    ResourceClass::ALL
        .iter()
        .find(|c| c.key() == key)
        .map(|c| c.label())
        .unwrap_or(key)
}

pub fn format_report(report: &StatusReport) -> String {
    let mut out = String::new();

    let updated = report
        .snapshot
        .as_ref()
        .map(|s| s.timestamp.to_string())
        .unwrap_or_else(|| "never".to_string());

    out.push_str("\n╔══════════════════════════════════════════╗\n");
    out.push_str("║  Cluster Status                          ║\n");
    out.push_str("╠══════════════════════════════════════════╣\n");
    out.push_str(&format!("║  {} {:<37}║\n", report.verdict.symbol(), report.message));
    out.push_str(&format!("║  Updated: {:<31}║\n", updated));
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    if let Some(snapshot) = &report.snapshot {
        for (class, map) in &snapshot.classes {
            let verdict = report.classes.get(class).copied().unwrap_or(Verdict::Unknown);
            out.push_str(&format!(
                "{} {} — {}\n",
                verdict.symbol(),
                class_label(class),
                verdict.class_label()
            ));
            for (name, status) in map {
                out.push_str(&format!("  {} {:<32} {}\n", status.symbol(), name, status));
            }
            out.push('\n');
        }
    }

    if !report.uptime.is_empty() {
        out.push_str("Uptime (last 24h):\n");
        for (class, stats) in &report.uptime {
            let pct = stats
                .percent_up()
                .map(|p| format!("{p:.1}%"))
                .unwrap_or_else(|| "n/a".to_string());
            out.push_str(&format!(
                "  {:<14} {:>6}  ({} up, {} partial, {} down)\n",
                class_label(class),
                pct,
                stats.up_hours,
                stats.partial_hours,
                stats.down_hours
            ));
        }
    }

    out
}
