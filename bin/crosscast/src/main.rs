//! crosscast deploys one immutable artifact to many networks through the
//! shared deterministic-address factory and proves each deployment.

mod cli;
mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

use cli::{Cli, Command, DeployArgs, StatusArgs};
use config::RunConfig;
use crosscast_deploy::{
    DeploymentManifest, DeploymentRequest, DeploymentResult, NetworkCatalog, Orchestrator, Outcome,
    RpcEnvironment, status_check,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Deploy(args) => deploy(args).await,
        Command::Status(args) => status(args).await,
    }
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let config = RunConfig::load(&args)?;

    let catalog = NetworkCatalog::load_from_file(&config.networks)?;
    let request = load_request(&config.manifest)?;

    let signer = broadcasting_signer()?;
    let env = RpcEnvironment::new(signer)?;

    tracing::info!(
        networks = catalog.len(),
        expected_address = %request.expected_address,
        label = %request.verification_label,
        "Starting deployment run..."
    );

    let orchestrator = Orchestrator::new(catalog, request).with_options(config.run_options());

    match orchestrator.run(&env).await {
        Ok(report) => {
            println!("{}", results_table(&report.results));
            for result in &report.results {
                if let Some(command) = &result.verify_command {
                    println!("{}: {}", result.network, command);
                }
            }

            if let Some(report_path) = &config.report {
                report.save_to_file(report_path)?;
            }

            Ok(())
        }
        Err(run_error) => {
            // Show which networks already succeeded before the abort; the
            // error itself propagates so the process exits non-zero.
            if !run_error.results.is_empty() {
                println!("{}", results_table(&run_error.results));
            }
            Err(run_error.error.into())
        }
    }
}

async fn status(args: StatusArgs) -> Result<()> {
    let networks = args.networks.unwrap_or_else(|| PathBuf::from("Networks.toml"));
    let manifest = args.manifest.unwrap_or_else(|| PathBuf::from("Crosscast.toml"));
    let probe_timeout = Duration::from_secs(args.probe_timeout.unwrap_or(10));

    let catalog = NetworkCatalog::load_from_file(&networks)?;
    let request = load_request(&manifest)?;

    let env = RpcEnvironment::read_only()?;
    let report = status_check(&env, &catalog, &request, probe_timeout).await;

    println!("{report}");

    if !report.consistent {
        anyhow::bail!("deployment state is inconsistent across the network set");
    }

    Ok(())
}

/// Load the manifest and resolve it into a request, with artifact paths
/// relative to the manifest's directory.
fn load_request(manifest_path: &Path) -> Result<DeploymentRequest> {
    let manifest = DeploymentManifest::load_from_file(manifest_path)?;

    let base_dir = if manifest_path.is_dir() {
        manifest_path.to_path_buf()
    } else {
        manifest_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    manifest.into_request(&base_dir)
}

/// The broadcasting key, taken from the environment and never logged.
fn broadcasting_signer() -> Result<PrivateKeySigner> {
    std::env::var("CROSSCAST_PRIVATE_KEY")
        .context("CROSSCAST_PRIVATE_KEY is not set")?
        .parse()
        .context("CROSSCAST_PRIVATE_KEY is not a valid private key")
}

/// Render per-network results as a table.
fn results_table(results: &[DeploymentResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Network", "Outcome", "Address", "Code hash"]);

    for result in results {
        let outcome = match &result.outcome {
            Outcome::Failed(reason) => format!("failed: {reason}"),
            outcome => outcome.to_string(),
        };
        let code_hash = result
            .code_hash
            .map(|hash| hash.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            result.network.to_string(),
            outcome,
            result.address.to_string(),
            code_hash,
        ]);
    }

    table
}
