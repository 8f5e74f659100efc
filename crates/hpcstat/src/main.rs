//! hpcstat — cluster status probe.
//!
//! Probes login nodes (SSH port reachability) and SLURM partitions
//! (`scontrol`), writes the current status document, and folds the run into
//! a rolling 24-hour uptime history.
//!
//! # Usage
//!
//! ```text
//! hpcstat run                     # one run, for a systemd timer or cron
//! hpcstat watch --interval 300    # run every five minutes until Ctrl-C
//! hpcstat show --format json      # print the persisted status
//! hpcstat init --path hpcstat.toml
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hpcstat",
    about = "Cluster login node and SLURM partition status probe",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Config file (default: /etc/hpcstat/hpcstat.toml, if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Directory containing the `scontrol` binary
    #[arg(long)]
    pub slurm_bin_dir: Option<PathBuf>,
    /// Current status document
    #[arg(long)]
    pub status_path: Option<PathBuf>,
    /// Uptime history document
    #[arg(long)]
    pub history_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe everything once and persist the result
    Run {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Probe on a fixed interval until interrupted
    Watch {
        #[command(flatten)]
        overrides: Overrides,
        /// Seconds between runs
        #[arg(long, default_value = "300")]
        interval: u64,
    },
    /// Print the persisted status and 24h uptime
    Show {
        #[command(flatten)]
        overrides: Overrides,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Write a config file with the default settings
    Init {
        #[arg(short, long, default_value = "hpcstat.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(format: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,hpcstat=debug"))?;

    match format {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_format)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { overrides } => commands::run::run(config_path, &overrides).await,
        Commands::Watch { overrides, interval } => {
            commands::run::watch(config_path, &overrides, interval).await
        }
        Commands::Show { overrides, format } => commands::show::show(config_path, &overrides, &format),
        Commands::Init { path, force } => commands::init::init(&path, force),
    }
}
