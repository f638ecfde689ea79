//! Failure taxonomy for a deployment run.
//!
//! Every variant is terminal for the current run: nothing is internally
//! retried, and nothing is downgraded to a warning. The operator fixes the
//! cause and re-runs the whole process, which is safe because re-running is
//! idempotent for already-deployed networks.

use alloy_core::primitives::{Address, B256};

use crate::catalog::NetworkName;
use crate::report::DeploymentResult;

/// A failure in one of the run's operations, with full network context.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Preflight found an address without code on a network (or could not
    /// confirm its presence within the probe timeout). Raised for the
    /// factory itself as well as for each declared dependency.
    #[error("missing dependency on {network}: no code at {address}")]
    MissingDependency {
        network: NetworkName,
        address: Address,
    },

    /// The factory call reverted, returned a zero address, or reported
    /// success while leaving no code at the returned address. `success` and
    /// `address` carry the raw outcome so a revert can be told apart from a
    /// ghost deployment.
    #[error("factory deploy failed on {network} (call success: {success}, returned address: {address})")]
    DeployFailed {
        network: NetworkName,
        success: bool,
        address: Address,
    },

    /// The deterministic-address guarantee broke: this network produced a
    /// different address than every network is expected to share.
    #[error("deployed address mismatch on {network}: expected {expected}, got {actual}")]
    UnexpectedDeployedAddress {
        network: NetworkName,
        expected: Address,
        actual: Address,
    },

    /// The code at the deployed address does not match the expected
    /// artifact: bytecode drift between networks, or an address collision
    /// with unrelated code.
    #[error("deployed code hash mismatch on {network}: expected {expected}, got {actual}")]
    UnexpectedDeployedCodeHash {
        network: NetworkName,
        expected: B256,
        actual: B256,
    },

    /// A remote-environment operation failed outside the classes above,
    /// e.g. the network context could not be bound or a post-deploy hash
    /// fetch failed at the transport level.
    #[error("environment failure on {network}: {source}")]
    Environment {
        network: NetworkName,
        #[source]
        source: anyhow::Error,
    },
}

impl DeployError {
    /// The network the failure occurred on.
    pub fn network(&self) -> &NetworkName {
        match self {
            Self::MissingDependency { network, .. }
            | Self::DeployFailed { network, .. }
            | Self::UnexpectedDeployedAddress { network, .. }
            | Self::UnexpectedDeployedCodeHash { network, .. }
            | Self::Environment { network, .. } => network,
        }
    }
}

/// A failed run: the error that aborted it plus the results recorded before
/// the abort, so the caller still sees which networks already succeeded.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunError {
    pub error: DeployError,
    pub results: Vec<DeploymentResult>,
}
