//! `notch` — CLI entry point for the network-configuration collector.

mod agent_client;
mod commands;

use std::path::PathBuf;

use clap::Parser;

/// Periodic, unattended backup of device configuration over a
/// vendor-specific CLI command sequence.
#[derive(Parser, Debug)]
#[command(name = "notch", version, about = "Network device configuration collector")]
pub struct Cli {
    /// Device-access agent address (host:port), repeatable. Falls back to
    /// `NOTCH_AGENTS` (comma-separated) when not supplied.
    #[arg(short = 'a', long = "agent", env = "NOTCH_AGENTS", value_delimiter = ',')]
    pub agents: Vec<String>,

    /// Path to the YAML configuration file.
    #[arg(short = 'f', long = "config")]
    pub config: PathBuf,

    /// Collection name to run, or "all".
    #[arg(short = 'c', long = "collection", default_value = "all")]
    pub collection: String,

    /// Restrict the run to one exact device name.
    #[arg(short = 'n', long = "device")]
    pub device: Option<String>,

    /// Restrict the run to devices matching this regex, overriding each
    /// recipe's own device-selection regex.
    #[arg(short = 'r', long = "regexp")]
    pub regexp: Option<String>,

    /// Raise logging to debug level.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    std::process::exit(commands::run(&cli).await);
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "notch=debug,info" } else { "notch=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
