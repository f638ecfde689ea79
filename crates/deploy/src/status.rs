//! Read-only status check for a deployment across the network set.
//!
//! Probes every network for the expected address and hash without signing
//! or broadcasting anything; degraded networks are reported, not fatal.

use std::fmt;
use std::time::Duration;

use alloy_core::primitives::B256;

use crate::DeploymentRequest;
use crate::catalog::{NetworkCatalog, NetworkName};
use crate::environment::{NetworkContext, RemoteEnvironment};

/// Status of the expected deployment on one network.
pub struct NetworkStatus {
    pub network: NetworkName,
    /// Whether the network context could be bound at all.
    pub reachable: bool,
    /// Whether code is present at the expected address.
    pub has_code: bool,
    /// The observed code hash, when one could be fetched.
    pub observed_hash: Option<B256>,
    /// Whether the observed hash matches the expected one.
    pub hash_match: bool,
}

impl NetworkStatus {
    fn unreachable(network: &NetworkName) -> Self {
        Self {
            network: network.clone(),
            reachable: false,
            has_code: false,
            observed_hash: None,
            hash_match: false,
        }
    }
}

/// Status report for the whole catalog.
pub struct StatusReport {
    pub statuses: Vec<NetworkStatus>,
    /// Overall consistency: every network reachable, holding code at the
    /// expected address with the expected hash.
    pub consistent: bool,
}

/// Probe every network in catalog order for the expected deployment.
pub async fn status_check<E: RemoteEnvironment>(
    env: &E,
    catalog: &NetworkCatalog,
    request: &DeploymentRequest,
    probe_timeout: Duration,
) -> StatusReport {
    let mut statuses = Vec::new();

    for network in catalog.iter() {
        let ctx = match env.with_active_network(network).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(network = %network.name, error = %e, "Network unreachable");
                statuses.push(NetworkStatus::unreachable(&network.name));
                continue;
            }
        };

        let has_code = matches!(
            tokio::time::timeout(probe_timeout, ctx.has_code(request.expected_address)).await,
            Ok(Ok(true))
        );

        let observed_hash = if has_code {
            match tokio::time::timeout(probe_timeout, ctx.code_hash(request.expected_address))
                .await
            {
                Ok(Ok(hash)) => Some(hash),
                _ => None,
            }
        } else {
            None
        };

        statuses.push(NetworkStatus {
            network: network.name.clone(),
            reachable: true,
            has_code,
            observed_hash,
            hash_match: observed_hash == Some(request.expected_code_hash),
        });
    }

    let consistent = compute_consistent(&statuses);

    StatusReport {
        statuses,
        consistent,
    }
}

fn compute_consistent(statuses: &[NetworkStatus]) -> bool {
    !statuses.is_empty()
        && statuses
            .iter()
            .all(|s| s.reachable && s.has_code && s.hash_match)
}

// -- Display implementations for printing status reports --

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.consistent {
            "CONSISTENT"
        } else {
            "INCONSISTENT"
        };
        writeln!(f, "Deployment status: {}", status)?;
        for network_status in &self.statuses {
            writeln!(f, "{}", network_status)?;
        }
        Ok(())
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.reachable {
            return write!(f, "  [DOWN] {}", self.network);
        }

        let icon = if self.has_code && self.hash_match {
            "[ok]"
        } else {
            "[MISSING]"
        };
        write!(f, "  {} {} code={}", icon, self.network, self.has_code)?;

        if let Some(hash) = self.observed_hash {
            let hash_status = if self.hash_match { "ok" } else { "MISMATCH" };
            write!(f, " hash={hash} ({hash_status})")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::b256;

    const HASH: B256 =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");

    fn consistent_status(name: &str) -> NetworkStatus {
        NetworkStatus {
            network: NetworkName::from(name),
            reachable: true,
            has_code: true,
            observed_hash: Some(HASH),
            hash_match: true,
        }
    }

    #[test]
    fn test_consistent_report() {
        assert!(compute_consistent(&[
            consistent_status("net1"),
            consistent_status("net2")
        ]));
    }

    #[test]
    fn test_empty_report_is_inconsistent() {
        assert!(!compute_consistent(&[]));
    }

    #[test]
    fn test_unreachable_network_breaks_consistency() {
        let statuses = vec![
            consistent_status("net1"),
            NetworkStatus::unreachable(&NetworkName::from("net2")),
        ];
        assert!(!compute_consistent(&statuses));
    }

    #[test]
    fn test_hash_mismatch_breaks_consistency() {
        let mut drifted = consistent_status("net2");
        drifted.hash_match = false;
        assert!(!compute_consistent(&[consistent_status("net1"), drifted]));
    }

    #[test]
    fn test_missing_code_breaks_consistency() {
        let mut missing = consistent_status("net1");
        missing.has_code = false;
        missing.observed_hash = None;
        missing.hash_match = false;
        assert!(!compute_consistent(&[missing]));
    }
}
