//! SLURM partition state via `scontrol show partition <name>`.
//!
//! Only the `State=UP` token is inspected. A failed invocation of any kind
//! (spawn error, non-zero exit, timeout) yields `unknown` rather than
//! failing the run.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use hpcstat_core::ResourceStatus;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProbeError;
use crate::probe::{Probe, ProbeFuture};

pub const DEFAULT_SLURM_BIN_DIR: &str = "/apps/slurm/latest/bin";
pub const DEFAULT_SLURM_TIMEOUT: Duration = Duration::from_secs(10);

const UP_MARKER: &str = "State=UP";

#[derive(Debug, Clone)]
pub struct PartitionProbe {
    scontrol: PathBuf,
    timeout: Duration,
}

impl Default for PartitionProbe {
    fn default() -> Self {
        Self::new(Path::new(DEFAULT_SLURM_BIN_DIR).join("scontrol"), DEFAULT_SLURM_TIMEOUT)
    }
}

impl PartitionProbe {
    /// `scontrol` is the full path to the binary.
    pub fn new(scontrol: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            scontrol: scontrol.into(),
            timeout,
        }
    }

    pub fn scontrol(&self) -> &Path {
        &self.scontrol
    }

    async fn query(&self, partition: &str) -> Result<ResourceStatus, ProbeError> {
        let child = Command::new(&self.scontrol)
            .args(["show", "partition", partition])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProbeError::Spawn)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(ProbeError::Spawn)?,
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(ProbeError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let status = parse_partition_state(&stdout);
        debug!(%partition, %status, "scontrol reported partition state");
        Ok(status)
    }
}

/// Interpret successful `scontrol show partition` output.
pub fn parse_partition_state(output: &str) -> ResourceStatus {
    if output.contains(UP_MARKER) {
        ResourceStatus::Up
    } else {
        ResourceStatus::Down
    }
}

impl Probe for PartitionProbe {
    fn check<'a>(&'a self, resource: &'a str) -> ProbeFuture<'a> {
        Box::pin(self.query(resource))
    }

    fn fallback(&self, _error: &ProbeError) -> ResourceStatus {
        ResourceStatus::Unknown
    }
}
