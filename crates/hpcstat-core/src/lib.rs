//! hpcstat-core — status aggregation and uptime history for hpcstat.
//!
//! Everything in this crate is pure: probes, files, and clocks live in the
//! other crates and hand their results in.
//!
//! # Data flow
//!
//! ```text
//! ResourceClassMap (per class, from probes)
//!   └── SnapshotBuilder → Snapshot (hour-aligned, raw statuses)
//!         └── condense_all → UptimeEntry (one CondensedStatus per class)
//!               └── UptimeLog::record → merged + pruned history
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod history;
pub mod report;
pub mod snapshot;
pub mod time;
pub mod types;

pub use aggregate::{condense, condense_all};
pub use config::HpcstatConfig;
pub use error::{CoreError, CoreResult};
pub use history::{merge, MergeOutcome, UptimeLog};
pub use snapshot::SnapshotBuilder;
pub use time::HourStamp;
pub use types::*;
