pub mod init;
pub mod run;
pub mod show;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use hpcstat_core::config::{HpcstatConfig, StorageBackend, DEFAULT_CONFIG_PATH};
use hpcstat_store::{JsonFileStore, RedbFileStore, StatusStore};
use tracing::debug;

use crate::Overrides;

/// Load the config file (or defaults) and apply command-line overrides.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<HpcstatConfig> {
    let mut config = match path {
        Some(path) => HpcstatConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => HpcstatConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))
            .with_context(|| format!("failed to read config {DEFAULT_CONFIG_PATH}"))?,
    };

    if let Some(dir) = &overrides.slurm_bin_dir {
        config.probe.slurm_bin_dir = dir.clone();
    }
    if let Some(p) = &overrides.status_path {
        config.storage.status_path = p.clone();
    }
    if let Some(p) = &overrides.history_path {
        config.storage.history_path = p.clone();
    }

    config.validate()?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

/// Build the configured store. Nothing is opened or created until it is used.
pub fn open_store(config: &HpcstatConfig) -> Arc<dyn StatusStore> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(
            storage.status_path.clone(),
            storage.history_path.clone(),
        )),
        StorageBackend::Redb => Arc::new(RedbFileStore::new(storage.redb_path.clone())),
    }
}
