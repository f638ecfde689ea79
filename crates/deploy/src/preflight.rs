//! Phase 1: read-only dependency verification across the network set.
//!
//! The apply phase is only entered when every network passes, so no network
//! ever receives a deploy attempt while another one in the same run is known
//! to be unready. This trades latency for an all-or-nothing dependency
//! guarantee.

use std::time::Duration;

use alloy_core::primitives::Address;

use crate::catalog::{Network, NetworkCatalog, NetworkName};
use crate::environment::{NetworkContext, RemoteEnvironment};
use crate::error::DeployError;

/// Verify that the factory and all declared dependencies carry code on one
/// network.
///
/// The factory is probed first, then each dependency in declaration order;
/// the first address without code fails the check. Purely observational: no
/// signing, no broadcast.
pub async fn check_network<E: RemoteEnvironment>(
    env: &E,
    network: &Network,
    factory: Address,
    dependencies: &[Address],
    probe_timeout: Duration,
) -> Result<(), DeployError> {
    let ctx = env
        .with_active_network(network)
        .await
        .map_err(|source| DeployError::Environment {
            network: network.name.clone(),
            source,
        })?;

    probe(&ctx, factory, probe_timeout).await?;

    for dependency in dependencies {
        probe(&ctx, *dependency, probe_timeout).await?;
    }

    tracing::debug!(
        network = %network.name,
        dependencies = dependencies.len(),
        "Preflight passed"
    );

    Ok(())
}

/// Verify every network in the catalog, in catalog order.
///
/// With `concurrent` set, the per-network checks run as parallel tasks;
/// results are still merged in catalog order, so the first missing
/// dependency by catalog order is reported even when several networks have
/// problems at once.
pub async fn check_all<E: RemoteEnvironment>(
    env: &E,
    catalog: &NetworkCatalog,
    factory: Address,
    dependencies: &[Address],
    probe_timeout: Duration,
    concurrent: bool,
) -> Result<(), DeployError> {
    if concurrent {
        let checks = catalog
            .iter()
            .map(|network| check_network(env, network, factory, dependencies, probe_timeout));

        for result in futures::future::join_all(checks).await {
            result?;
        }
    } else {
        for network in catalog.iter() {
            check_network(env, network, factory, dependencies, probe_timeout).await?;
        }
    }

    Ok(())
}

/// Probe one address for code, folding timeout expiry and transport failure
/// into the missing-dependency class: presence that cannot be confirmed is
/// treated as absence.
async fn probe<C: NetworkContext>(
    ctx: &C,
    address: Address,
    probe_timeout: Duration,
) -> Result<(), DeployError> {
    let missing = |network: &NetworkName| DeployError::MissingDependency {
        network: network.clone(),
        address,
    };

    match tokio::time::timeout(probe_timeout, ctx.has_code(address)).await {
        Ok(Ok(true)) => Ok(()),
        Ok(Ok(false)) => Err(missing(ctx.network())),
        Ok(Err(e)) => {
            tracing::warn!(
                network = %ctx.network(),
                address = %address,
                error = %e,
                "Existence probe failed"
            );
            Err(missing(ctx.network()))
        }
        Err(_) => {
            tracing::warn!(
                network = %ctx.network(),
                address = %address,
                "Existence probe timed out"
            );
            Err(missing(ctx.network()))
        }
    }
}
