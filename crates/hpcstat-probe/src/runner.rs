//! Runner — probes every configured class, then records the run.
//!
//! A run probes resources one at a time, builds the snapshot only once every
//! class map is complete, and hands it to the [`StatusStore`] which merges
//! and prunes the uptime history and writes both documents.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDateTime;
use hpcstat_core::config::HpcstatConfig;
use hpcstat_core::{condense_all, ResourceClass, Snapshot, SnapshotBuilder, UptimeEntry};
use hpcstat_store::StatusStore;
use tokio::sync::watch;
use tracing::{error, info};

use crate::probe::{probe_class, Probe};
use crate::slurm::PartitionProbe;
use crate::ssh::SshProbe;

/// One monitored resource class and the probe that checks it.
pub struct ClassProbe {
    pub class: String,
    pub resources: Vec<String>,
    pub probe: Arc<dyn Probe>,
}

impl ClassProbe {
    pub fn new(class: impl Into<String>, resources: Vec<String>, probe: Arc<dyn Probe>) -> Self {
        Self {
            class: class.into(),
            resources,
            probe,
        }
    }
}

/// Outcome of a single run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: Snapshot,
    pub condensed: UptimeEntry,
    pub history_len: usize,
}

pub struct Runner {
    classes: Vec<ClassProbe>,
    store: Arc<dyn StatusStore>,
}

impl Runner {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self {
            classes: Vec::new(),
            store,
        }
    }

    /// Add a resource class to probe on every run.
    pub fn with_class(mut self, class: ClassProbe) -> Self {
        self.classes.push(class);
        self
    }

    /// Build the standard login-node and partition runner from config.
    pub fn from_config(config: &HpcstatConfig, store: Arc<dyn StatusStore>) -> anyhow::Result<Self> {
        let ssh = SshProbe::new(config.probe.ssh_port, config.probe.ssh_timeout()?);
        let slurm = PartitionProbe::new(config.probe.scontrol_path(), config.probe.slurm_timeout()?);

        Ok(Self::new(store)
            .with_class(ClassProbe::new(
                ResourceClass::LoginNodes.key(),
                config.cluster.login_nodes.clone(),
                Arc::new(ssh),
            ))
            .with_class(ClassProbe::new(
                ResourceClass::SlurmQueues.key(),
                config.cluster.partitions.clone(),
                Arc::new(slurm),
            )))
    }

    /// Probe everything and assemble the snapshot for the hour of `now`.
    pub async fn collect(&self, now: NaiveDateTime) -> Snapshot {
        let mut builder = SnapshotBuilder::new(now);
        for class in &self.classes {
            let map = probe_class(class.probe.as_ref(), &class.resources).await;
            builder = builder.class(class.class.clone(), map);
        }
        builder.build()
    }

    /// Run every probe once and persist the result.
    pub async fn run_once(&self, now: NaiveDateTime) -> anyhow::Result<RunReport> {
        let snapshot = self.collect(now).await;

        // File and database I/O stays off the async workers.
        let store = Arc::clone(&self.store);
        let pending = snapshot.clone();
        let history = tokio::task::spawn_blocking(move || store.record(&pending, now))
            .await
            .context("status store task panicked")?
            .context("failed to persist status")?;
        let condensed = condense_all(&snapshot);

        info!(
            timestamp = %snapshot.timestamp,
            classes = ?condensed.classes,
            history = history.len(),
            "status recorded"
        );

        Ok(RunReport {
            snapshot,
            condensed,
            history_len: history.len(),
        })
    }

    /// Run on a fixed interval until the shutdown signal fires.
    ///
    /// The first run starts immediately. A failed run is logged and the loop
    /// carries on.
    pub async fn watch(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "status watch started");

        loop {
            if let Err(e) = self.run_once(hpcstat_core::time::now()).await {
                error!(error = %format!("{e:#}"), "status run failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("status watch shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hpcstat_core::{CondensedStatus, ResourceStatus};
    use hpcstat_store::MemoryStore;

    use crate::error::ProbeError;
    use crate::probe::ProbeFuture;

    /// Scripted probe: fixed answers, missing resources fail, and every call
    /// is counted.
    struct FakeProbe {
        answers: HashMap<String, ResourceStatus>,
        fallback: ResourceStatus,
        calls: AtomicUsize,
    }

    impl FakeProbe {
        fn new(answers: &[(&str, ResourceStatus)], fallback: ResourceStatus) -> Arc<Self> {
            Arc::new(Self {
                answers: answers.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
                fallback,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Probe for FakeProbe {
        fn check<'a>(&'a self, resource: &'a str) -> ProbeFuture<'a> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let answer = self
                .answers
                .get(resource)
                .copied()
                .ok_or(ProbeError::Timeout(Duration::from_secs(10)));
            Box::pin(async move { answer })
        }

        fn fallback(&self, _error: &ProbeError) -> ResourceStatus {
            self.fallback
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn partial_partitions_scenario() {
        let store = Arc::new(MemoryStore::new());
        let slurm = FakeProbe::new(
            &[("milan", ResourceStatus::Up), ("skylake", ResourceStatus::Down)],
            ResourceStatus::Unknown,
        );
        let runner = Runner::new(store.clone()).with_class(ClassProbe::new(
            "slurm_queues",
            names(&["milan", "skylake"]),
            slurm,
        ));

        let report = runner.run_once(dt("2024-05-01T10:12:00")).await.unwrap();

        assert_eq!(report.condensed.status("slurm_queues"), Some(CondensedStatus::Partial));
        let raw = report.snapshot.class("slurm_queues").unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw["milan"], ResourceStatus::Up);
        assert_eq!(raw["skylake"], ResourceStatus::Down);
        assert_eq!(store.load_snapshot().unwrap(), Some(report.snapshot));
    }

    #[tokio::test]
    async fn probe_failures_use_class_fallback() {
        let store = Arc::new(MemoryStore::new());
        let ssh = FakeProbe::new(&[("n1", ResourceStatus::Up)], ResourceStatus::Down);
        let slurm = FakeProbe::new(&[], ResourceStatus::Unknown);
        let runner = Runner::new(store)
            .with_class(ClassProbe::new("login_nodes", names(&["n1", "n2"]), ssh))
            .with_class(ClassProbe::new("slurm_queues", names(&["milan"]), slurm));

        let snapshot = runner.collect(dt("2024-05-01T10:00:00")).await;
        assert_eq!(snapshot.class("login_nodes").unwrap()["n2"], ResourceStatus::Down);
        assert_eq!(snapshot.class("slurm_queues").unwrap()["milan"], ResourceStatus::Unknown);
    }

    #[tokio::test]
    async fn every_resource_probed_once_per_run() {
        let ssh = FakeProbe::new(
            &[("n1", ResourceStatus::Up), ("n2", ResourceStatus::Up), ("n3", ResourceStatus::Up)],
            ResourceStatus::Down,
        );
        let runner = Runner::new(Arc::new(MemoryStore::new())).with_class(ClassProbe::new(
            "login_nodes",
            names(&["n1", "n2", "n3"]),
            ssh.clone(),
        ));

        runner.run_once(dt("2024-05-01T10:00:00")).await.unwrap();
        assert_eq!(ssh.calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn hourly_runs_build_history() {
        let store = Arc::new(MemoryStore::new());
        let ssh = FakeProbe::new(&[("n1", ResourceStatus::Up)], ResourceStatus::Down);
        let runner = Runner::new(store.clone())
            .with_class(ClassProbe::new("login_nodes", names(&["n1"]), ssh));

        for ts in ["2024-05-01T10:00:00", "2024-05-01T11:00:00", "2024-05-01T12:00:00"] {
            runner.run_once(dt(ts)).await.unwrap();
        }

        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 3);
        assert!(history
            .entries()
            .iter()
            .all(|e| e.status("login_nodes") == Some(CondensedStatus::Up)));
    }

    #[tokio::test]
    async fn from_config_uses_both_classes() {
        let mut config = HpcstatConfig::default();
        config.cluster.login_nodes = Vec::new();
        config.cluster.partitions = Vec::new();

        let runner = Runner::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
        let snapshot = runner.collect(dt("2024-05-01T10:00:00")).await;

        assert_eq!(snapshot.classes.len(), 2);
        assert!(snapshot.class("login_nodes").unwrap().is_empty());
        assert!(snapshot.class("slurm_queues").unwrap().is_empty());
    }

    /// Memory store that remembers which thread recorded the run.
    #[derive(Default)]
    struct ThreadTrackingStore {
        inner: MemoryStore,
        recorded_on: std::sync::Mutex<Option<std::thread::ThreadId>>,
    }

    impl StatusStore for ThreadTrackingStore {
        fn load_snapshot(&self) -> hpcstat_store::StoreResult<Option<Snapshot>> {
            self.inner.load_snapshot()
        }

        fn save_snapshot(&self, snapshot: &Snapshot) -> hpcstat_store::StoreResult<()> {
            self.inner.save_snapshot(snapshot)
        }

        fn load_history(&self) -> hpcstat_store::StoreResult<hpcstat_core::UptimeLog> {
            self.inner.load_history()
        }

        fn save_history(&self, log: &hpcstat_core::UptimeLog) -> hpcstat_store::StoreResult<()> {
            self.inner.save_history(log)
        }

        fn record(
            &self,
            snapshot: &Snapshot,
            now: NaiveDateTime,
        ) -> hpcstat_store::StoreResult<hpcstat_core::UptimeLog> {
            *self.recorded_on.lock().unwrap() = Some(std::thread::current().id());
            self.inner.record(snapshot, now)
        }
    }

    #[tokio::test]
    async fn store_io_runs_on_blocking_thread() {
        let store = Arc::new(ThreadTrackingStore::default());
        let runner = Runner::new(store.clone());

        let report = runner.run_once(dt("2024-05-01T10:00:00")).await.unwrap();
        assert_eq!(report.history_len, 1);

        // The test runtime is single-threaded, so any other thread is the
        // blocking pool.
        let recorded_on = store.recorded_on.lock().unwrap().unwrap();
        assert_ne!(recorded_on, std::thread::current().id());
        assert!(store.load_snapshot().unwrap().is_some());
    }

    #[tokio::test]
    async fn watch_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let runner = Runner::new(store.clone());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            runner.watch(Duration::from_secs(3600), rx).await;
        });

        // The first run happens before the loop waits.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watch did not stop")
            .unwrap();

        assert!(store.load_snapshot().unwrap().is_some());
    }
}
