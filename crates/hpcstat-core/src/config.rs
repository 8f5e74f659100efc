//! hpcstat.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/hpcstat/hpcstat.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HpcstatConfig {
    pub cluster: ClusterConfig,
    pub probe: ProbeConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Login node hostnames, probed on the SSH port.
    pub login_nodes: Vec<String>,
    /// SLURM partition names, probed through `scontrol`.
    pub partitions: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            login_nodes: vec![
                "tooarrana1.hpc.swin.edu.au".to_string(),
                "tooarrana2.hpc.swin.edu.au".to_string(),
                "farnarkle1.hpc.swin.edu.au".to_string(),
                "farnarkle2.hpc.swin.edu.au".to_string(),
            ],
            partitions: vec![
                "milan".to_string(),
                "skylake".to_string(),
                "trevor".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ssh_port: u16,
    pub ssh_timeout: String,
    pub slurm_timeout: String,
    /// Directory containing the `scontrol` binary.
    pub slurm_bin_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            ssh_timeout: "5s".to_string(),
            slurm_timeout: "10s".to_string(),
            slurm_bin_dir: PathBuf::from("/apps/slurm/latest/bin"),
        }
    }
}

impl ProbeConfig {
    pub fn ssh_timeout(&self) -> CoreResult<Duration> {
        parse_duration(&self.ssh_timeout)
            .ok_or_else(|| CoreError::InvalidDuration(self.ssh_timeout.clone()))
    }

    pub fn slurm_timeout(&self) -> CoreResult<Duration> {
        parse_duration(&self.slurm_timeout)
            .ok_or_else(|| CoreError::InvalidDuration(self.slurm_timeout.clone()))
    }

    pub fn scontrol_path(&self) -> PathBuf {
        self.slurm_bin_dir.join("scontrol")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Two JSON documents on disk.
    #[default]
    Json,
    /// An embedded redb database.
    Redb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub status_path: PathBuf,
    pub history_path: PathBuf,
    pub redb_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            status_path: PathBuf::from("/var/spool/jobmon/status/status.json"),
            history_path: PathBuf::from("/var/spool/jobmon/status/uptime.json"),
            redb_path: PathBuf::from("/var/spool/jobmon/status/hpcstat.redb"),
        }
    }
}

impl HpcstatConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HpcstatConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(?path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that parse but cannot work at runtime.
    pub fn validate(&self) -> CoreResult<()> {
        if self.probe.ssh_timeout()?.is_zero() {
            return Err(CoreError::Invalid("probe.ssh_timeout must be non-zero".into()));
        }
        if self.probe.slurm_timeout()?.is_zero() {
            return Err(CoreError::Invalid("probe.slurm_timeout must be non-zero".into()));
        }
        let paths = match self.storage.backend {
            StorageBackend::Json => vec![&self.storage.status_path, &self.storage.history_path],
            StorageBackend::Redb => vec![&self.storage.redb_path],
        };
        if paths.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(CoreError::Invalid("storage paths must not be empty".into()));
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "2m", or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
