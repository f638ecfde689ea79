use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "crosscast")]
#[command(
    author,
    version,
    about = "Deploy one artifact to every network through the deterministic factory"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CROSSCAST_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the two-phase deployment across every listed network.
    ///
    /// Phase 1 verifies the factory and all declared dependencies on every
    /// network; phase 2 deploys (or skips) and verifies each network in
    /// catalog order. The broadcasting key is taken from the
    /// CROSSCAST_PRIVATE_KEY environment variable and never logged.
    Deploy(DeployArgs),

    /// Probe every network for the expected deployment without
    /// broadcasting anything.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Path to the networks file, or a directory containing Networks.toml.
    #[arg(long, alias = "nets")]
    pub networks: Option<PathBuf>,

    /// Path to the deployment manifest, or a directory containing
    /// Crosscast.toml.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Path to an optional TOML configuration file.
    ///
    /// Values are layered: defaults, then the file, then CROSSCAST_-prefixed
    /// environment variables, then explicit flags.
    #[arg(long, alias = "conf")]
    pub config: Option<PathBuf>,

    /// Where to write the JSON run report after a successful run.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Timeout in seconds for a single read-only probe.
    #[arg(long)]
    pub probe_timeout: Option<u64>,

    /// Timeout in seconds for a single factory broadcast.
    #[arg(long)]
    pub broadcast_timeout: Option<u64>,

    /// Check networks one at a time during preflight instead of in
    /// parallel.
    #[arg(long)]
    pub sequential_preflight: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Path to the networks file, or a directory containing Networks.toml.
    #[arg(long, alias = "nets")]
    pub networks: Option<PathBuf>,

    /// Path to the deployment manifest, or a directory containing
    /// Crosscast.toml.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Timeout in seconds for a single read-only probe.
    #[arg(long)]
    pub probe_timeout: Option<u64>,
}
