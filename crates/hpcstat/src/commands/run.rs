use std::path::Path;
use std::time::Duration;

use hpcstat_probe::Runner;
use tokio::sync::watch;
use tracing::info;

use super::{load_config, open_store};
use crate::Overrides;

pub async fn run(config_path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<()> {
    let config = load_config(config_path, overrides)?;
    let runner = Runner::from_config(&config, open_store(&config))?;

    let report = runner.run_once(hpcstat_core::time::now()).await?;
    for (class, status) in &report.condensed.classes {
        info!(%class, %status, "class status");
    }
    Ok(())
}

pub async fn watch(
    config_path: Option<&Path>,
    overrides: &Overrides,
    interval_secs: u64,
) -> anyhow::Result<()> {
    anyhow::ensure!(interval_secs > 0, "--interval must be at least 1 second");

    let config = load_config(config_path, overrides)?;
    let runner = Runner::from_config(&config, open_store(&config))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    runner
        .watch(Duration::from_secs(interval_secs), shutdown_rx)
        .await;

    info!("hpcstat stopped");
    Ok(())
}
