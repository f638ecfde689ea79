//! crosscast-deploy - Cross-network deterministic deployment library.
//!
//! This crate deploys a single immutable creation payload to many
//! independent networks through a shared deterministic-address factory and
//! proves each deployment landed at the expected address with the expected
//! bytecode. The protocol has two phases: a read-only preflight across the
//! whole network set, then a sequential deploy-and-verify pass.

use alloy_core::primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod catalog;
pub mod environment;
pub mod error;
pub mod factory;
pub mod manifest;
pub mod orchestrator;
pub mod preflight;
pub mod report;
pub mod rpc;
pub mod status;
pub mod verify;

pub use catalog::{Network, NetworkCatalog, NetworkName};
pub use environment::{CallOutcome, NetworkContext, RemoteEnvironment, RpcEnvironment};
pub use error::{DeployError, RunError};
pub use factory::DETERMINISTIC_FACTORY;
pub use manifest::DeploymentManifest;
pub use orchestrator::{Orchestrator, RunOptions};
pub use report::{DeploymentResult, Outcome, RunReport};
pub use status::{StatusReport, status_check};

/// One logical deployment: the immutable value every phase operates on.
///
/// `expected_address` and `expected_code_hash` are ground truth supplied by
/// the caller (pre-computed off-system); the core checks against them and
/// never derives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Opaque creation payload handed to the factory.
    pub code: Bytes,
    /// The address the factory is expected to produce on every network.
    pub expected_address: Address,
    /// Hash the deployed bytecode must match post-deploy.
    pub expected_code_hash: B256,
    /// Addresses that must already carry code on a network before
    /// deployment is attempted there, in declaration order.
    pub dependencies: Vec<Address>,
    /// Opaque label used only in the post-deploy verification instruction.
    pub verification_label: String,
    /// The deterministic factory address.
    pub factory: Address,
}

impl DeploymentRequest {
    /// Deterministic SHA-256 fingerprint of the request.
    ///
    /// The same request always produces the same fingerprint; it keys run
    /// reports to the exact artifact and expectations they were made for.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self)
            .expect("DeploymentRequest serialization should never fail");

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, b256, bytes};

    fn request() -> DeploymentRequest {
        DeploymentRequest {
            code: bytes!("60016000f3"),
            expected_address: address!("000000000000000000000000000000000000c0de"),
            expected_code_hash: b256!(
                "1111111111111111111111111111111111111111111111111111111111111111"
            ),
            dependencies: vec![],
            verification_label: "Example".to_string(),
            factory: DETERMINISTIC_FACTORY,
        }
    }

    #[test]
    fn test_fingerprint_determinism() {
        let fingerprint = request().fingerprint();
        assert_eq!(fingerprint, request().fingerprint());
        assert_eq!(fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_code() {
        let mut changed = request();
        changed.code = bytes!("60026000f3");
        assert_ne!(request().fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_expected_address() {
        let mut changed = request();
        changed.expected_address = address!("000000000000000000000000000000000000dead");
        assert_ne!(request().fingerprint(), changed.fingerprint());
    }
}
