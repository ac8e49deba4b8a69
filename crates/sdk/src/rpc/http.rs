// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025 Centrifuge Network Foundation. All rights reserved.
//  https://centrifuge.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! HTTP JSON-RPC client for read-only chain access.

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, de::DeserializeOwned};

use crate::rpc::{ChainReadClient, LogFilter, RawLog, error::RpcClientError};

/// Envelope of a JSON-RPC HTTP response.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

/// The error object of a failed JSON-RPC response.
#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Wire representation of a log entry as returned by `eth_getLogs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    block_number: U256,
    transaction_hash: B256,
    log_index: U256,
}

/// Client for making HTTP-based JSON-RPC requests to chain nodes.
///
/// This client targets Ethereum-compatible networks, providing typed execution of the read-only
/// subset of the `eth_` namespace the SDK consumes.
#[derive(Debug)]
pub struct HttpRpcClient {
    /// The chain id this client is connected to.
    chain_id: u64,
    /// The HTTP URL for the chain node's RPC endpoint.
    http_rpc_url: String,
    /// The HTTP client for making RPC requests.
    http_client: reqwest::Client,
}

impl HttpRpcClient {
    /// Creates a new HTTP RPC client for the given chain and endpoint URL.
    #[must_use]
    pub fn new(chain_id: u64, http_rpc_url: String) -> Self {
        Self {
            chain_id,
            http_rpc_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Executes a JSON-RPC request and deserializes the `result` field into the specified type.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the node reports a JSON-RPC error, or the
    /// response cannot be parsed.
    pub async fn execute_rpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcClientError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.http_rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcClientError::ClientError(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RpcClientError::ClientError(e.to_string()))?;

        let parsed: JsonRpcResponse<T> =
            serde_json::from_slice(bytes.as_ref()).map_err(|e| {
                let raw = String::from_utf8_lossy(bytes.as_ref());
                let preview = if raw.len() > 500 {
                    format!("{}... (truncated, {} bytes total)", &raw[..500], raw.len())
                } else {
                    raw.to_string()
                };
                RpcClientError::ResponseParsingError(format!(
                    "Failed to parse '{method}' response: {e}\nRaw response: {preview}"
                ))
            })?;

        if let Some(error) = parsed.error {
            return Err(RpcClientError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        parsed.result.ok_or_else(|| {
            RpcClientError::ResponseParsingError(String::from(
                "Response missing both result and error fields",
            ))
        })
    }

    /// Creates the parameters of an `eth_call` request targeting a specific contract address with
    /// encoded function data.
    #[must_use]
    pub fn construct_eth_call(
        address: Address,
        call_data: &[u8],
        block: Option<u64>,
    ) -> serde_json::Value {
        let call = serde_json::json!({
            "to": address.to_string(),
            "data": format!("0x{}", hex::encode(call_data)),
        });
        serde_json::json!([call, block_tag(block)])
    }

    /// Creates the parameters of an `eth_getLogs` request from a [`LogFilter`].
    #[must_use]
    pub fn construct_get_logs(filter: &LogFilter) -> serde_json::Value {
        let mut params = serde_json::json!({
            "fromBlock": format!("0x{:x}", filter.from_block),
            "toBlock": format!("0x{:x}", filter.to_block),
        });
        if let Some(addresses) = &filter.addresses {
            params["address"] = serde_json::json!(
                addresses.iter().map(ToString::to_string).collect::<Vec<_>>()
            );
        }
        if !filter.topics.is_empty() {
            // Position 0 with a set of alternatives: any of the given event signatures
            params["topics"] = serde_json::json!([filter.topics]);
        }
        serde_json::json!([params])
    }
}

fn block_tag(block: Option<u64>) -> serde_json::Value {
    match block {
        Some(number) => serde_json::json!(format!("0x{number:x}")),
        None => serde_json::json!("latest"),
    }
}

/// Decodes a hexadecimal string response from a chain RPC call.
///
/// # Errors
///
/// Returns an [`RpcClientError::AbiDecodingError`] if the hex decoding fails.
pub fn decode_hex_response(encoded_response: &str) -> Result<Vec<u8>, RpcClientError> {
    let encoded_str = encoded_response
        .strip_prefix("0x")
        .unwrap_or(encoded_response);
    hex::decode(encoded_str)
        .map_err(|e| RpcClientError::AbiDecodingError(format!("Error decoding hex response: {e}")))
}

#[async_trait::async_trait]
impl ChainReadClient for HttpRpcClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn read_contract(
        &self,
        address: Address,
        call_data: Bytes,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcClientError> {
        let params = Self::construct_eth_call(address, &call_data, block);
        let encoded: String = self.execute_rpc_call("eth_call", params).await?;
        decode_hex_response(&encoded)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcClientError> {
        let params = Self::construct_get_logs(filter);
        let logs: Vec<RpcLog> = self.execute_rpc_call("eth_getLogs", params).await?;
        Ok(logs
            .into_iter()
            .map(|log| RawLog {
                address: log.address,
                topics: log.topics,
                data: log.data,
                block_number: log.block_number.to::<u64>(),
                transaction_hash: log.transaction_hash,
                log_index: log.log_index.to::<u64>(),
            })
            .collect())
    }

    async fn block_number(&self) -> Result<u64, RpcClientError> {
        let encoded: String = self
            .execute_rpc_call("eth_blockNumber", serde_json::json!([]))
            .await?;
        let stripped = encoded.strip_prefix("0x").unwrap_or(&encoded);
        u64::from_str_radix(stripped, 16).map_err(|e| {
            RpcClientError::ResponseParsingError(format!("Invalid block number '{encoded}': {e}"))
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_construct_eth_call_latest() {
        let params = HttpRpcClient::construct_eth_call(
            address!("cA11bde05977b3631167028862bE2a173976CA11"),
            &[0x12, 0x34],
            None,
        );
        assert_eq!(params[0]["data"], "0x1234");
        assert_eq!(params[1], "latest");
    }

    #[rstest]
    fn test_construct_eth_call_pinned_block() {
        let params = HttpRpcClient::construct_eth_call(Address::ZERO, &[], Some(255));
        assert_eq!(params[1], "0xff");
    }

    #[rstest]
    fn test_construct_get_logs_full_filter() {
        let filter = LogFilter {
            from_block: 16,
            to_block: 32,
            addresses: Some(vec![address!("1111111111111111111111111111111111111111")]),
            topics: vec![B256::ZERO],
        };
        let params = HttpRpcClient::construct_get_logs(&filter);
        assert_eq!(params[0]["fromBlock"], "0x10");
        assert_eq!(params[0]["toBlock"], "0x20");
        assert_eq!(params[0]["address"].as_array().unwrap().len(), 1);
        // topic0 alternatives are nested one level deep
        assert_eq!(params[0]["topics"][0].as_array().unwrap().len(), 1);
    }

    #[rstest]
    fn test_construct_get_logs_unrestricted() {
        let filter = LogFilter {
            from_block: 1,
            to_block: 2,
            addresses: None,
            topics: vec![],
        };
        let params = HttpRpcClient::construct_get_logs(&filter);
        assert!(params[0].get("address").is_none());
        assert!(params[0].get("topics").is_none());
    }

    #[rstest]
    #[case("0x1234", vec![0x12, 0x34])]
    #[case("1234", vec![0x12, 0x34])]
    #[case("0x", vec![])]
    fn test_decode_hex_response(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(decode_hex_response(input).unwrap(), expected);
    }

    #[rstest]
    fn test_decode_hex_response_invalid() {
        assert!(decode_hex_response("0xzz").is_err());
    }
}
