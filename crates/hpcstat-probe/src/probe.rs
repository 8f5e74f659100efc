//! The probe seam shared by every resource class.

use std::future::Future;
use std::pin::Pin;

use hpcstat_core::{ResourceClassMap, ResourceStatus};
use tracing::{debug, warn};

use crate::error::ProbeError;

/// Boxed future returned by [`Probe::check`].
pub type ProbeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResourceStatus, ProbeError>> + Send + 'a>>;

/// Determines the status of one named resource.
pub trait Probe: Send + Sync {
    /// Probe a single resource.
    fn check<'a>(&'a self, resource: &'a str) -> ProbeFuture<'a>;

    /// Status to record when [`check`](Probe::check) fails.
    fn fallback(&self, error: &ProbeError) -> ResourceStatus;

    /// Probe a resource, folding any failure into its fallback status.
    fn status<'a>(&'a self, resource: &'a str) -> Pin<Box<dyn Future<Output = ResourceStatus> + Send + 'a>> {
        Box::pin(async move {
            match self.check(resource).await {
                Ok(status) => {
                    debug!(%resource, %status, "probe result");
                    status
                }
                Err(e) => {
                    let status = self.fallback(&e);
                    warn!(%resource, kind = e.kind(), error = %e, %status, "probe failed");
                    status
                }
            }
        })
    }
}

/// Probe every resource in turn and collect the complete class map.
pub async fn probe_class(probe: &dyn Probe, resources: &[String]) -> ResourceClassMap {
    let mut map = ResourceClassMap::new();
    for resource in resources {
        let status = probe.status(resource).await;
        map.insert(resource.clone(), status);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Answers from a fixed table; missing resources time out.
    struct TableProbe(HashMap<&'static str, ResourceStatus>);

    impl Probe for TableProbe {
        fn check<'a>(&'a self, resource: &'a str) -> ProbeFuture<'a> {
            let answer = self
                .0
                .get(resource)
                .copied()
                .ok_or(ProbeError::Timeout(Duration::from_secs(1)));
            Box::pin(async move { answer })
        }

        fn fallback(&self, _error: &ProbeError) -> ResourceStatus {
            ResourceStatus::Unknown
        }
    }

    #[tokio::test]
    async fn failures_fold_to_fallback() {
        let probe = TableProbe(HashMap::from([("milan", ResourceStatus::Up)]));
        assert_eq!(probe.status("milan").await, ResourceStatus::Up);
        assert_eq!(probe.status("trevor").await, ResourceStatus::Unknown);
    }

    #[tokio::test]
    async fn probe_class_covers_every_resource() {
        let probe = TableProbe(HashMap::from([
            ("milan", ResourceStatus::Up),
            ("skylake", ResourceStatus::Down),
        ]));
        let resources = vec!["milan".to_string(), "skylake".to_string(), "trevor".to_string()];

        let map = probe_class(&probe, &resources).await;
        assert_eq!(map.len(), 3);
        assert_eq!(map["milan"], ResourceStatus::Up);
        assert_eq!(map["skylake"], ResourceStatus::Down);
        assert_eq!(map["trevor"], ResourceStatus::Unknown);
    }

    #[tokio::test]
    async fn empty_resource_list_gives_empty_map() {
        let probe = TableProbe(HashMap::new());
        assert!(probe_class(&probe, &[]).await.is_empty());
    }
}
