//! Phase 2 spend: invoking the shared deterministic factory.

use std::time::Duration;

use alloy_core::primitives::{Address, Bytes, U256, address};

use crate::environment::NetworkContext;
use crate::error::DeployError;

/// The deterministic deployment proxy, pre-deployed at the same address on
/// every supported network.
pub const DETERMINISTIC_FACTORY: Address = address!("4e59b44847b379578588920cA78FbF26c0B4956C");

/// Deploy the creation payload through the factory on the context's network
/// and return the resulting address.
///
/// Success requires all of: the call did not revert, the returned address is
/// non-zero, and code is actually present at that address afterward. The
/// last guard catches factories that report success but deploy nothing.
/// This is the only operation in the system that spends funds.
pub async fn deploy<C: NetworkContext>(
    ctx: &C,
    factory: Address,
    code: &Bytes,
    broadcast_timeout: Duration,
    probe_timeout: Duration,
) -> Result<Address, DeployError> {
    let network = ctx.network().clone();

    tracing::info!(
        network = %network,
        factory = %factory,
        payload_bytes = code.len(),
        "Invoking deterministic factory"
    );

    let outcome = match tokio::time::timeout(
        broadcast_timeout,
        ctx.broadcast_call(factory, code, U256::ZERO),
    )
    .await
    {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::warn!(network = %network, error = %e, "Factory broadcast failed");
            return Err(DeployError::DeployFailed {
                network,
                success: false,
                address: Address::ZERO,
            });
        }
        Err(_) => {
            tracing::warn!(network = %network, "Factory broadcast timed out");
            return Err(DeployError::DeployFailed {
                network,
                success: false,
                address: Address::ZERO,
            });
        }
    };

    let deployed = returned_address(&outcome.return_data);

    if !outcome.success || deployed == Address::ZERO {
        return Err(DeployError::DeployFailed {
            network,
            success: outcome.success,
            address: deployed,
        });
    }

    // Silent no-op guard: a successful call must leave code behind.
    let present = match tokio::time::timeout(probe_timeout, ctx.has_code(deployed)).await {
        Ok(Ok(present)) => present,
        Ok(Err(_)) | Err(_) => false,
    };

    if !present {
        return Err(DeployError::DeployFailed {
            network,
            success: outcome.success,
            address: deployed,
        });
    }

    tracing::info!(network = %network, address = %deployed, "Factory deploy confirmed");

    Ok(deployed)
}

/// Extract the deployed address from the factory's return data.
///
/// The factory returns the address as its trailing 20 bytes (a bare address
/// or an ABI-encoded word). Anything shorter parses to the zero address.
fn returned_address(return_data: &Bytes) -> Address {
    if return_data.len() < Address::len_bytes() {
        return Address::ZERO;
    }
    Address::from_slice(&return_data[return_data.len() - Address::len_bytes()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, bytes};

    #[test]
    fn test_returned_address_from_bare_bytes() {
        let data = bytes!("000000000000000000000000000000000000c0de");
        assert_eq!(
            returned_address(&data),
            address!("000000000000000000000000000000000000c0de")
        );
    }

    #[test]
    fn test_returned_address_from_abi_word() {
        // 32-byte word with the address right-aligned.
        let data = bytes!("000000000000000000000000000000000000000000000000000000000000c0de");
        assert_eq!(
            returned_address(&data),
            address!("000000000000000000000000000000000000c0de")
        );
    }

    #[test]
    fn test_returned_address_empty_is_zero() {
        assert_eq!(returned_address(&Bytes::new()), Address::ZERO);
        assert_eq!(returned_address(&bytes!("c0de")), Address::ZERO);
    }
}
