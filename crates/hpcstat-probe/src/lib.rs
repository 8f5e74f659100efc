//! hpcstat-probe — health probes and the run loop for hpcstat.
//!
//! Provides the two probe collaborators and the [`Runner`] that drives them.
//! Probes are sequential and each is bounded by its own timeout, so a run
//! takes at most `login_nodes × ssh_timeout + partitions × slurm_timeout`.
//!
//! # Architecture
//!
//! ```text
//! Runner
//!   ├── ClassProbe "login_nodes"  → SshProbe       (TCP connect to :22)
//!   ├── ClassProbe "slurm_queues" → PartitionProbe (scontrol show partition)
//!   │     └── probe_class() → ResourceClassMap (complete before use)
//!   ├── SnapshotBuilder → Snapshot
//!   └── StatusStore::record → merged + pruned UptimeLog, both documents written
//! ```
//!
//! # Failure policy
//!
//! Every probe error has an explicit kind ([`ProbeError`]) and is logged
//! individually. An unreachable login node folds to `down`; a partition
//! whose query fails in any way folds to `unknown`. No probe error ever
//! reaches the store.

pub mod error;
pub mod probe;
pub mod runner;
pub mod slurm;
pub mod ssh;

pub use error::ProbeError;
pub use probe::{probe_class, Probe, ProbeFuture};
pub use runner::{ClassProbe, RunReport, Runner};
pub use slurm::PartitionProbe;
pub use ssh::SshProbe;
