//! The remote-environment boundary and its JSON-RPC implementation.
//!
//! The orchestration core never talks to a network directly: it goes through
//! [`RemoteEnvironment`], which binds one network at a time into a scoped
//! [`NetworkContext`]. The context is an explicit value threaded through
//! every operation, so concurrent or test-harness use cannot leak the active
//! network between calls.

use alloy_core::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde_json::Value;

use crate::catalog::{Network, NetworkName};
use crate::rpc;

/// Gas limit attached to the factory broadcast.
const BROADCAST_GAS_LIMIT: u64 = 3_000_000;

/// Raw outcome of a broadcast call: whether it succeeded on-chain and
/// whatever bytes it returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub success: bool,
    pub return_data: Bytes,
}

/// Capabilities bound to one active network.
///
/// Obtained from [`RemoteEnvironment::with_active_network`] and released
/// when dropped at the end of the owning operation.
#[allow(async_fn_in_trait)]
pub trait NetworkContext {
    /// The network this context is bound to.
    fn network(&self) -> &NetworkName;

    /// Read-only existence probe: is there code at `address`?
    async fn has_code(&self, address: Address) -> Result<bool>;

    /// Fingerprint of the code at `address` (keccak-256 of the deployed
    /// bytecode; hash of empty bytes if the address carries no code).
    async fn code_hash(&self, address: Address) -> Result<B256>;

    /// Send a signed call to `target` under this network's broadcasting
    /// identity and return the raw outcome.
    async fn broadcast_call(
        &self,
        target: Address,
        payload: &Bytes,
        value: U256,
    ) -> Result<CallOutcome>;
}

/// Per-run handle able to bind a network context.
#[allow(async_fn_in_trait)]
pub trait RemoteEnvironment {
    type Context<'a>: NetworkContext
    where
        Self: 'a;

    /// Switch the active network, yielding a context scoped to it.
    async fn with_active_network(&self, network: &Network) -> Result<Self::Context<'_>>;
}

/// Production environment over Ethereum JSON-RPC endpoints.
///
/// Holds the broadcasting identity for the whole run; the private key is
/// consumed at construction and only the derived sender address is kept and
/// logged.
pub struct RpcEnvironment {
    client: reqwest::Client,
    sender: Address,
}

impl RpcEnvironment {
    /// Build an environment from a local signer.
    pub fn new(signer: PrivateKeySigner) -> Result<Self> {
        let client = rpc::create_client()?;
        // alloy-signer-local is on a newer primitives release than the rest
        // of the stack; convert the address at the byte level.
        let sender = Address::from_slice(signer.address().as_slice());
        tracing::info!(sender = %sender, "Broadcasting identity derived");
        Ok(Self { client, sender })
    }

    /// Build an environment with no broadcasting identity.
    ///
    /// Suitable only for read-only flows (status checks); a broadcast from
    /// the zero sender is rejected by any real endpoint.
    pub fn read_only() -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            sender: Address::ZERO,
        })
    }

    /// The sender address transactions are broadcast from.
    pub fn sender(&self) -> Address {
        self.sender
    }
}

impl RemoteEnvironment for RpcEnvironment {
    type Context<'a>
        = RpcContext<'a>
    where
        Self: 'a;

    async fn with_active_network(&self, network: &Network) -> Result<RpcContext<'_>> {
        let url = network.rpc_url.to_string();

        // Confirm the endpoint is alive before handing out a context.
        let chain_id: String = rpc::json_rpc_call(&self.client, &url, "eth_chainId", vec![])
            .await
            .with_context(|| format!("Failed to reach RPC endpoint for {}", network.name))?;
        let chain_id = rpc::parse_hex_u64(&chain_id)?;

        tracing::debug!(network = %network.name, chain_id, "Network context activated");

        Ok(RpcContext {
            client: &self.client,
            url,
            sender: self.sender,
            network: network.name.clone(),
        })
    }
}

/// A [`NetworkContext`] bound to one JSON-RPC endpoint.
pub struct RpcContext<'a> {
    client: &'a reqwest::Client,
    url: String,
    sender: Address,
    network: NetworkName,
}

impl RpcContext<'_> {
    /// Fetch the raw code bytes at `address`.
    async fn get_code(&self, address: Address) -> Result<Vec<u8>> {
        let code: String = rpc::json_rpc_call(
            self.client,
            &self.url,
            "eth_getCode",
            vec![
                serde_json::json!(format!("{address:#x}")),
                serde_json::json!("latest"),
            ],
        )
        .await
        .with_context(|| format!("Failed to fetch code at {address} on {}", self.network))?;

        hex::decode(code.trim_start_matches("0x")).context("Invalid code hex in response")
    }
}

impl NetworkContext for RpcContext<'_> {
    fn network(&self) -> &NetworkName {
        &self.network
    }

    async fn has_code(&self, address: Address) -> Result<bool> {
        Ok(!self.get_code(address).await?.is_empty())
    }

    async fn code_hash(&self, address: Address) -> Result<B256> {
        Ok(keccak256(self.get_code(address).await?))
    }

    async fn broadcast_call(
        &self,
        target: Address,
        payload: &Bytes,
        value: U256,
    ) -> Result<CallOutcome> {
        let call_object: Value = serde_json::json!({
            "from": format!("{:#x}", self.sender),
            "to": format!("{target:#x}"),
            "value": format!("{value:#x}"),
            "data": format!("0x{}", hex::encode(payload)),
            "gas": format!("{BROADCAST_GAS_LIMIT:#x}"),
        });

        // `eth_sendTransaction` carries no return data, so simulate first to
        // capture what the call returns. A reverting simulation is reported
        // as a failed outcome without spending gas.
        let return_data = match rpc::json_rpc_call::<String>(
            self.client,
            &self.url,
            "eth_call",
            vec![call_object.clone(), serde_json::json!("latest")],
        )
        .await
        {
            Ok(data) => Bytes::from(
                hex::decode(data.trim_start_matches("0x"))
                    .context("Invalid return data hex in response")?,
            ),
            Err(e) => {
                tracing::warn!(network = %self.network, error = %e, "Call simulation reverted");
                return Ok(CallOutcome {
                    success: false,
                    return_data: Bytes::new(),
                });
            }
        };

        let tx_hash: String = rpc::json_rpc_call(
            self.client,
            &self.url,
            "eth_sendTransaction",
            vec![call_object],
        )
        .await
        .with_context(|| format!("Failed to broadcast transaction on {}", self.network))?;

        tracing::info!(network = %self.network, tx_hash = %tx_hash, "Transaction broadcast");

        let success = rpc::wait_for_receipt(self.client, &self.url, &tx_hash).await?;

        Ok(CallOutcome {
            success,
            return_data,
        })
    }
}
