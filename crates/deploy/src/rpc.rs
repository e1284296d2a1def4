//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
/// A `null` result deserializes into `None` when `T` is an `Option`.
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

    parse_response(method, result)
}

/// Extract the `result` member of a JSON-RPC response body.
fn parse_response<T: DeserializeOwned>(method: &str, mut body: Value) -> Result<T, anyhow::Error> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown");

        match error.get("code").and_then(|c| c.as_i64()) {
            Some(code) => anyhow::bail!("{} failed: RPC error {}: {}", method, code, message),
            None => anyhow::bail!("{} failed: RPC error: {}", method, message),
        }
    }

    let result_value = body
        .get_mut("result")
        .map(Value::take)
        .context("No result in response")?;

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::U64;

    use super::*;

    #[test]
    fn test_parse_quantity_result() {
        let body = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": "0x89"});
        let chain_id: U64 = parse_response("eth_chainId", body).unwrap();
        assert_eq!(chain_id.to::<u64>(), 137);
    }

    #[test]
    fn test_parse_null_result_as_none() {
        let body = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": null});
        let receipt: Option<Value> = parse_response("eth_getTransactionReceipt", body).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "insufficient funds for gas * price + value"}
        });

        let err = parse_response::<Value>("eth_sendRawTransaction", body).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("eth_sendRawTransaction"));
        assert!(message.contains("-32000"));
        assert!(message.contains("insufficient funds"));
    }

    #[test]
    fn test_missing_result_is_an_error() {
        let body = serde_json::json!({"jsonrpc": "2.0", "id": 1});
        assert!(parse_response::<Value>("eth_chainId", body).is_err());
    }
}
