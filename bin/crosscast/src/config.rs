//! Layered run configuration for the CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crosscast_deploy::RunOptions;

use crate::cli::DeployArgs;

/// Resolved configuration for a deploy run.
///
/// Layering order, later wins: built-in defaults, the optional config file,
/// `CROSSCAST_`-prefixed environment variables, explicit CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Path to the networks file.
    pub networks: PathBuf,
    /// Path to the deployment manifest.
    pub manifest: PathBuf,
    /// Where to write the JSON run report, if anywhere.
    pub report: Option<PathBuf>,
    /// Timeout in seconds for a single read-only probe.
    pub probe_timeout_secs: u64,
    /// Timeout in seconds for a single factory broadcast.
    pub broadcast_timeout_secs: u64,
    /// Check networks one at a time during preflight.
    pub sequential_preflight: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            networks: PathBuf::from("Networks.toml"),
            manifest: PathBuf::from("Crosscast.toml"),
            report: None,
            probe_timeout_secs: 10,
            broadcast_timeout_secs: 180,
            sequential_preflight: false,
        }
    }
}

impl RunConfig {
    /// Resolve the configuration from all layers.
    pub fn load(args: &DeployArgs) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));

        if let Some(config_path) = &args.config {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed("CROSSCAST_").ignore(&["PRIVATE_KEY", "VERBOSITY"]));

        let mut config: RunConfig = figment
            .extract()
            .context("Failed to load run configuration")?;

        // Explicit flags take precedence over every other layer.
        if let Some(networks) = &args.networks {
            config.networks = networks.clone();
        }
        if let Some(manifest) = &args.manifest {
            config.manifest = manifest.clone();
        }
        if let Some(report) = &args.report {
            config.report = Some(report.clone());
        }
        if let Some(probe_timeout) = args.probe_timeout {
            config.probe_timeout_secs = probe_timeout;
        }
        if let Some(broadcast_timeout) = args.broadcast_timeout {
            config.broadcast_timeout_secs = broadcast_timeout;
        }
        if args.sequential_preflight {
            config.sequential_preflight = true;
        }

        Ok(config)
    }

    /// The orchestrator options this configuration describes.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            broadcast_timeout: Duration::from_secs(self.broadcast_timeout_secs),
            concurrent_preflight: !self.sequential_preflight,
        }
    }
}
