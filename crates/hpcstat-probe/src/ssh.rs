//! Login node reachability.
//!
//! A node is `up` when a TCP connection to its SSH port completes within
//! the timeout. No SSH handshake is attempted.

use std::time::Duration;

use hpcstat_core::ResourceStatus;
use tokio::net::TcpStream;

use crate::error::ProbeError;
use crate::probe::{Probe, ProbeFuture};

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SshProbe {
    port: u16,
    timeout: Duration,
}

impl Default for SshProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SSH_PORT, DEFAULT_SSH_TIMEOUT)
    }
}

impl SshProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

/// Try a TCP connection to `host:port`.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> Result<ResourceStatus, ProbeError> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(ResourceStatus::Up),
        Ok(Err(e)) => Err(ProbeError::Connect(e)),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

impl Probe for SshProbe {
    fn check<'a>(&'a self, resource: &'a str) -> ProbeFuture<'a> {
        Box::pin(tcp_probe(resource, self.port, self.timeout))
    }

    /// An unreachable login node is down; reachability never yields `unknown`.
    fn fallback(&self, _error: &ProbeError) -> ResourceStatus {
        ResourceStatus::Down
    }
}
