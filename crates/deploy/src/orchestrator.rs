//! The two-phase deployment protocol across the network set.
//!
//! Phase 1 (preflight) verifies every network before any state-mutating
//! action; phase 2 (apply) walks the catalog in order, deploying or skipping
//! per network and verifying every outcome. Any failure aborts the rest of
//! the run; already-succeeded networks stay deployed and recorded.

use std::time::Duration;

use alloy_core::primitives::Address;
use chrono::Utc;

use crate::catalog::{Network, NetworkCatalog};
use crate::environment::{NetworkContext, RemoteEnvironment};
use crate::error::{DeployError, RunError};
use crate::report::{DeploymentResult, Outcome, RunReport};
use crate::{DeploymentRequest, factory, preflight, verify};

/// Caller-supplied knobs for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Timeout for a single read-only probe (existence check, hash fetch).
    pub probe_timeout: Duration,
    /// Timeout for a single factory broadcast including receipt wait.
    pub broadcast_timeout: Duration,
    /// Run the phase-1 checks as parallel tasks. Results are merged in
    /// catalog order either way; phase 2 is always sequential.
    pub concurrent_preflight: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            broadcast_timeout: Duration::from_secs(180),
            concurrent_preflight: true,
        }
    }
}

/// Drives one deployment request across one network catalog.
pub struct Orchestrator {
    catalog: NetworkCatalog,
    request: DeploymentRequest,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(catalog: NetworkCatalog, request: DeploymentRequest) -> Self {
        Self {
            catalog,
            request,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the two-phase protocol.
    ///
    /// On failure the returned [`RunError`] still carries every result
    /// recorded before the abort, so the caller can report which networks
    /// already succeeded.
    pub async fn run<E: RemoteEnvironment>(&self, env: &E) -> Result<RunReport, RunError> {
        let started_at = Utc::now();

        tracing::info!(
            networks = self.catalog.len(),
            expected_address = %self.request.expected_address,
            dependencies = self.request.dependencies.len(),
            "Phase 1: preflight dependency checks"
        );

        preflight::check_all(
            env,
            &self.catalog,
            self.request.factory,
            &self.request.dependencies,
            self.options.probe_timeout,
            self.options.concurrent_preflight,
        )
        .await
        .map_err(|error| RunError {
            error,
            results: Vec::new(),
        })?;

        tracing::info!("Phase 2: deploying to each network in catalog order");

        let mut results = Vec::new();

        for network in self.catalog.iter() {
            match self.apply_network(env, network).await {
                Ok(result) => {
                    if let Some(command) = &result.verify_command {
                        tracing::info!(network = %network.name, "To verify bytecode, run: {command}");
                    }
                    results.push(result);
                }
                Err(error) => {
                    tracing::error!(network = %network.name, error = %error, "Run aborted");
                    results.push(DeploymentResult::failed(&network.name, &error));
                    return Err(RunError { error, results });
                }
            }
        }

        let report = RunReport::new(self.request.fingerprint(), started_at, results);
        tracing::info!(networks = report.results.len(), "All networks deployed and verified");

        Ok(report)
    }

    /// Deploy (or skip) and verify one network.
    async fn apply_network<E: RemoteEnvironment>(
        &self,
        env: &E,
        network: &Network,
    ) -> Result<DeploymentResult, DeployError> {
        let environment_error = |source: anyhow::Error| DeployError::Environment {
            network: network.name.clone(),
            source,
        };

        let ctx = env
            .with_active_network(network)
            .await
            .map_err(environment_error)?;

        let already_present = tokio::time::timeout(
            self.options.probe_timeout,
            ctx.has_code(self.request.expected_address),
        )
        .await
        .map_err(|_| environment_error(anyhow::anyhow!("Existence probe timed out")))?
        .map_err(environment_error)?;

        let (outcome, deployed) = match verify::decide_action(already_present) {
            verify::Action::SkipAlreadyPresent => {
                tracing::info!(
                    network = %network.name,
                    address = %self.request.expected_address,
                    "Code already present, skipping deploy"
                );
                (Outcome::SkippedAlreadyPresent, self.request.expected_address)
            }
            verify::Action::Deploy => {
                let deployed = factory::deploy(
                    &ctx,
                    self.request.factory,
                    &self.request.code,
                    self.options.broadcast_timeout,
                    self.options.probe_timeout,
                )
                .await?;
                (Outcome::Deployed, deployed)
            }
        };

        // The hash check runs on the skip path too: unrelated bytecode at
        // the predicted address must fail, not silently pass.
        let observed_hash = tokio::time::timeout(self.options.probe_timeout, ctx.code_hash(deployed))
            .await
            .map_err(|_| environment_error(anyhow::anyhow!("Code hash fetch timed out")))?
            .map_err(environment_error)?;

        verify::verify_outcome(
            &network.name,
            deployed,
            self.request.expected_address,
            observed_hash,
            self.request.expected_code_hash,
        )?;

        tracing::info!(
            network = %network.name,
            address = %deployed,
            outcome = %outcome,
            "Deployment verified"
        );

        Ok(DeploymentResult::verified(
            &network.name,
            outcome,
            deployed,
            observed_hash,
            self.verify_command(network, deployed),
        ))
    }

    /// Build the advisory bytecode-verification instruction for a network.
    fn verify_command(&self, network: &Network, deployed: Address) -> String {
        format!(
            "forge verify-contract --chain {} {} {}",
            network.name, deployed, self.request.verification_label
        )
    }
}
