//! Pure decision logic for the deploy/skip choice and the post-deploy
//! checks. Operates only on already-fetched on-chain state.

use alloy_core::primitives::{Address, B256};

use crate::catalog::NetworkName;
use crate::error::DeployError;

/// What phase 2 should do for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No code at the expected address yet: invoke the factory.
    Deploy,
    /// Code already present at the expected address: the deployment is
    /// treated as already satisfied, making re-runs idempotent.
    SkipAlreadyPresent,
}

/// Decide whether a network needs a fresh deploy or already holds one.
pub fn decide_action(already_has_code: bool) -> Action {
    if already_has_code {
        Action::SkipAlreadyPresent
    } else {
        Action::Deploy
    }
}

/// Check the outcome of a deployment (or a skip) against expectations.
///
/// Address equality and code-hash equality are independent checks and both
/// must pass. The hash check runs on the skip path too: an address match
/// with an unexpected hash means unrelated bytecode occupies the predicted
/// address and must fail loudly.
pub fn verify_outcome(
    network: &NetworkName,
    deployed: Address,
    expected_address: Address,
    observed_hash: B256,
    expected_hash: B256,
) -> Result<(), DeployError> {
    if deployed != expected_address {
        return Err(DeployError::UnexpectedDeployedAddress {
            network: network.clone(),
            expected: expected_address,
            actual: deployed,
        });
    }

    if observed_hash != expected_hash {
        return Err(DeployError::UnexpectedDeployedCodeHash {
            network: network.clone(),
            expected: expected_hash,
            actual: observed_hash,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, b256};

    const EXPECTED: Address = address!("000000000000000000000000000000000000c0de");
    const HASH: B256 =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");
    const OTHER_HASH: B256 =
        b256!("2222222222222222222222222222222222222222222222222222222222222222");

    #[test]
    fn test_decide_action() {
        assert_eq!(decide_action(false), Action::Deploy);
        assert_eq!(decide_action(true), Action::SkipAlreadyPresent);
    }

    #[test]
    fn test_verify_outcome_accepts_matching_state() {
        let network = NetworkName::from("net1");
        assert!(verify_outcome(&network, EXPECTED, EXPECTED, HASH, HASH).is_ok());
    }

    #[test]
    fn test_verify_outcome_rejects_address_mismatch() {
        let network = NetworkName::from("net1");
        let actual = address!("000000000000000000000000000000000000dead");

        let err = verify_outcome(&network, actual, EXPECTED, HASH, HASH).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnexpectedDeployedAddress { expected, actual: got, .. }
                if expected == EXPECTED && got == actual
        ));
    }

    #[test]
    fn test_verify_outcome_rejects_hash_mismatch() {
        let network = NetworkName::from("net1");

        let err = verify_outcome(&network, EXPECTED, EXPECTED, OTHER_HASH, HASH).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnexpectedDeployedCodeHash { expected, actual, .. }
                if expected == HASH && actual == OTHER_HASH
        ));
    }

    #[test]
    fn test_address_check_runs_before_hash_check() {
        let network = NetworkName::from("net1");
        let actual = address!("000000000000000000000000000000000000dead");

        // Both checks would fail; the address mismatch is reported first.
        let err = verify_outcome(&network, actual, EXPECTED, OTHER_HASH, HASH).unwrap_err();
        assert!(matches!(err, DeployError::UnexpectedDeployedAddress { .. }));
    }
}
