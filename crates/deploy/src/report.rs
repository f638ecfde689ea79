//! Per-network deployment results and the aggregated run report.

use std::fmt;
use std::path::Path;

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::NetworkName;
use crate::error::DeployError;

/// Outcome of one (network, request) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Outcome {
    /// The factory was invoked and the deployment verified.
    Deployed,
    /// Code was already present at the expected address; verified without
    /// broadcasting.
    SkippedAlreadyPresent,
    /// The run aborted on this network with the given reason.
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

/// Record of what happened on one network. Immutable once recorded;
/// retained for the run's final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub network: NetworkName,
    pub outcome: Outcome,
    /// The observed address: the deployed (or already-present) address, or
    /// whatever address the failure left behind.
    pub address: Address,
    /// The observed code hash, when one was fetched.
    pub code_hash: Option<B256>,
    /// Ready-to-run bytecode-verification instruction for this network.
    /// Advisory text, present only for verified deployments.
    pub verify_command: Option<String>,
}

impl DeploymentResult {
    /// Record a verified deployment or skip.
    pub fn verified(
        network: &NetworkName,
        outcome: Outcome,
        address: Address,
        code_hash: B256,
        verify_command: String,
    ) -> Self {
        Self {
            network: network.clone(),
            outcome,
            address,
            code_hash: Some(code_hash),
            verify_command: Some(verify_command),
        }
    }

    /// Record the failure that aborted the run on this network.
    pub fn failed(network: &NetworkName, error: &DeployError) -> Self {
        let address = match error {
            DeployError::DeployFailed { address, .. } => *address,
            DeployError::UnexpectedDeployedAddress { actual, .. } => *actual,
            _ => Address::ZERO,
        };
        let code_hash = match error {
            DeployError::UnexpectedDeployedCodeHash { actual, .. } => Some(*actual),
            _ => None,
        };

        Self {
            network: network.clone(),
            outcome: Outcome::Failed(error.to_string()),
            address,
            code_hash,
            verify_command: None,
        }
    }
}

impl fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Failed(reason) => {
                write!(f, "  [FAILED] {}: {}", self.network, reason)
            }
            outcome => {
                write!(f, "  [ok] {}: {} at {}", self.network, outcome, self.address)
            }
        }
    }
}

/// Aggregated report of a whole run.
///
/// Saved as JSON next to the manifest after a successful run so CI and
/// operators have a machine-readable record of what landed where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Deterministic fingerprint of the deployment request.
    pub request_fingerprint: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// crosscast version that produced this report.
    pub version: String,
    /// Per-network results, in catalog order.
    pub results: Vec<DeploymentResult>,
}

impl RunReport {
    pub fn new(request_fingerprint: String, started_at: DateTime<Utc>, results: Vec<DeploymentResult>) -> Self {
        Self {
            request_fingerprint,
            started_at,
            finished_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            results,
        }
    }

    /// True when every recorded network deployed or skipped successfully.
    pub fn all_verified(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.outcome.is_success())
    }

    /// Save the report as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .context(format!("Failed to write run report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Run report saved");
        Ok(())
    }

    /// Load a previously saved report.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read run report from {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse run report JSON")
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.all_verified() {
            "VERIFIED"
        } else {
            "INCOMPLETE"
        };
        writeln!(f, "Run status: {} ({} networks)", status, self.results.len())?;
        for result in &self.results {
            writeln!(f, "{}", result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, b256};
    use tempdir::TempDir;

    fn verified_result(name: &str) -> DeploymentResult {
        DeploymentResult::verified(
            &NetworkName::from(name),
            Outcome::Deployed,
            address!("000000000000000000000000000000000000c0de"),
            b256!("1111111111111111111111111111111111111111111111111111111111111111"),
            format!("forge verify-contract --chain {name} 0x...c0de Example"),
        )
    }

    #[test]
    fn test_all_verified() {
        let report = RunReport::new(
            "fingerprint".to_string(),
            Utc::now(),
            vec![verified_result("net1"), verified_result("net2")],
        );
        assert!(report.all_verified());
    }

    #[test]
    fn test_empty_report_is_not_verified() {
        let report = RunReport::new("fingerprint".to_string(), Utc::now(), vec![]);
        assert!(!report.all_verified());
    }

    #[test]
    fn test_failed_result_marks_report_incomplete() {
        let error = DeployError::DeployFailed {
            network: NetworkName::from("net2"),
            success: false,
            address: Address::ZERO,
        };
        let report = RunReport::new(
            "fingerprint".to_string(),
            Utc::now(),
            vec![
                verified_result("net1"),
                DeploymentResult::failed(&NetworkName::from("net2"), &error),
            ],
        );
        assert!(!report.all_verified());
    }

    #[test]
    fn test_failed_result_keeps_observed_address() {
        let actual = address!("000000000000000000000000000000000000dead");
        let error = DeployError::UnexpectedDeployedAddress {
            network: NetworkName::from("net1"),
            expected: address!("000000000000000000000000000000000000c0de"),
            actual,
        };

        let result = DeploymentResult::failed(&NetworkName::from("net1"), &error);
        assert_eq!(result.address, actual);
        assert!(matches!(result.outcome, Outcome::Failed(_)));
    }

    #[test]
    fn test_report_round_trip() {
        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("run-report.json");

        let original = RunReport::new(
            "fingerprint".to_string(),
            Utc::now(),
            vec![verified_result("net1")],
        );
        original.save_to_file(&path).expect("Failed to save report");

        let loaded = RunReport::load_from_file(&path).expect("Failed to load report");
        assert_eq!(original, loaded);
    }
}
