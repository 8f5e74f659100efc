//! Probe failure kinds.

use std::time::Duration;

use thiserror::Error;

/// Why a probe could not produce a status on its own.
///
/// Probes never propagate these past the runner: each probe maps every kind
/// to a fallback status, and the runner logs the kind before folding it.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("command exited with {}: {stderr}", .code.map_or("signal".to_string(), |c| format!("status {c}")))]
    Exit { code: Option<i32>, stderr: String },
}

impl ProbeError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout(_) => "timeout",
            ProbeError::Connect(_) => "connect",
            ProbeError::Spawn(_) => "spawn",
            ProbeError::Exit { .. } => "exit",
        }
    }
}
