use std::path::Path;

use hpcstat_core::report::{format_report, StatusReport};
use hpcstat_store::StatusStore;

use super::{load_config, open_store};
use crate::Overrides;

pub fn show(config_path: Option<&Path>, overrides: &Overrides, format: &str) -> anyhow::Result<()> {
    let config = load_config(config_path, overrides)?;
    let store = open_store(&config);

    let snapshot = store.load_snapshot()?;
    let history = store.load_history()?;
    let report = StatusReport::new(snapshot, &history);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("{}", format_report(&report));
        }
    }

    Ok(())
}
