//! Shared JSON-RPC utilities for interacting with Ethereum endpoints.

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default timeout for a single HTTP request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between polling attempts when waiting for a receipt.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum time to wait for a broadcast transaction to be mined.
const RECEIPT_TIMEOUT_SECS: u64 = 120;

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// Returns an error if the request failed at the transport level or the
/// endpoint returned a JSON-RPC error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined and
/// return whether it succeeded (receipt status `0x1`).
pub async fn wait_for_receipt(
    client: &reqwest::Client,
    url: &str,
    tx_hash: &str,
) -> Result<bool, anyhow::Error> {
    let start = std::time::Instant::now();
    let max_duration = Duration::from_secs(RECEIPT_TIMEOUT_SECS);

    loop {
        if start.elapsed() > max_duration {
            anyhow::bail!("Timeout waiting for receipt of {}", tx_hash);
        }

        let receipt: Value = json_rpc_call(
            client,
            url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;

        match receipt.get("status").and_then(|s| s.as_str()) {
            Some(status) => return Ok(status == "0x1"),
            None => {
                tracing::trace!(tx_hash = %tx_hash, "Transaction not yet mined, retrying...");
            }
        }

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
    }
}

/// Parse a `0x`-prefixed hex quantity to u64.
pub fn parse_hex_u64(value: &str) -> Result<u64, anyhow::Error> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .with_context(|| format!("Invalid hex quantity: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0xaa36a7").unwrap(), 11155111);
        assert!(parse_hex_u64("not-hex").is_err());
    }
}
