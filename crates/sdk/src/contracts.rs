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

//! On-chain contract interfaces and call encoding.

use std::sync::Arc;

use alloy::{sol, sol_types::SolCall};
use alloy_primitives::{Address, Bytes, U256, address};
use async_trait::async_trait;
use centrifuge_model::CrossChainMessage;

use crate::{
    rpc::{ChainReadClient, RpcClientError},
    tx::{error::TransactionError, fees::BridgeFeeEstimator},
};

sol! {
    contract Multicall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

sol! {
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
}

sol! {
    contract ISelfMulticall {
        function multicall(bytes[] calldata data) external payable returns (bytes[] memory results);
    }
}

sol! {
    contract IVault {
        function requestDeposit(uint256 assets, address controller, address owner) external returns (uint256 requestId);
        function requestRedeem(uint256 shares, address controller, address owner) external returns (uint256 requestId);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function maxDeposit(address receiver) external view returns (uint256 maxAssets);
    }
}

sol! {
    contract IGateway {
        function messageGasLimit(uint64 centrifugeId, bytes calldata payload) external view returns (uint64);
        function maxBatchGasLimit(uint64 centrifugeId) external view returns (uint64);
        function estimate(uint64 centrifugeId, uint64 batchGas) external view returns (uint256);
    }
}

/// Standard Multicall3 address (same on all EVM chains).
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Encodes several payloads against one contract into a single `multicall(bytes[])` call.
#[must_use]
pub fn encode_contract_multicall(payloads: &[Bytes]) -> Bytes {
    ISelfMulticall::multicallCall {
        data: payloads.to_vec(),
    }
    .abi_encode()
    .into()
}

/// Read-side contract access for one chain, batching independent reads through Multicall3.
#[derive(Debug, Clone)]
pub struct ContractReader {
    client: Arc<dyn ChainReadClient>,
    multicall_address: Address,
}

impl ContractReader {
    /// Creates a new [`ContractReader`] for the client's chain.
    #[must_use]
    pub fn new(client: Arc<dyn ChainReadClient>) -> Self {
        Self {
            client,
            multicall_address: MULTICALL3_ADDRESS,
        }
    }

    /// Executes a single contract call, returning the raw return bytes.
    pub async fn call(
        &self,
        contract: Address,
        call_data: Bytes,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcClientError> {
        self.client.read_contract(contract, call_data, block).await
    }

    /// Executes multiple calls in one Multicall3 round trip; failed calls come back as
    /// unsuccessful results rather than failing the batch.
    pub async fn call_many(
        &self,
        calls: Vec<(Address, Bytes)>,
        block: Option<u64>,
    ) -> Result<Vec<Multicall3::Result>, RpcClientError> {
        let aggregate = Multicall3::aggregate3Call {
            calls: calls
                .into_iter()
                .map(|(target, call_data)| Multicall3::Call3 {
                    target,
                    allowFailure: true,
                    callData: call_data,
                })
                .collect(),
        };

        let response = self
            .client
            .read_contract(self.multicall_address, aggregate.abi_encode().into(), block)
            .await?;

        Multicall3::aggregate3Call::abi_decode_returns(&response).map_err(|e| {
            RpcClientError::AbiDecodingError(format!("Failed to decode multicall results: {e}"))
        })
    }

    /// Reads an ERC-20 balance.
    pub async fn erc20_balance(
        &self,
        token: Address,
        account: Address,
    ) -> Result<U256, RpcClientError> {
        let call = IERC20::balanceOfCall { account };
        let response = self.call(token, call.abi_encode().into(), None).await?;
        IERC20::balanceOfCall::abi_decode_returns(&response)
            .map_err(|e| RpcClientError::AbiDecodingError(format!("Failed to decode balance: {e}")))
    }

    /// Reads an ERC-20 allowance.
    pub async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, RpcClientError> {
        let call = IERC20::allowanceCall { owner, spender };
        let response = self.call(token, call.abi_encode().into(), None).await?;
        IERC20::allowanceCall::abi_decode_returns(&response).map_err(|e| {
            RpcClientError::AbiDecodingError(format!("Failed to decode allowance: {e}"))
        })
    }

    /// Reads an ERC-20's decimals.
    pub async fn erc20_decimals(&self, token: Address) -> Result<u8, RpcClientError> {
        let call = IERC20::decimalsCall {};
        let response = self.call(token, call.abi_encode().into(), None).await?;
        IERC20::decimalsCall::abi_decode_returns(&response).map_err(|e| {
            RpcClientError::AbiDecodingError(format!("Failed to decode decimals: {e}"))
        })
    }
}

/// Encodes an ERC-20 approval payload.
#[must_use]
pub fn encode_erc20_approve(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// Bridge fee estimator backed by the gateway contract on the source chain.
#[derive(Debug, Clone)]
pub struct GatewayFeeEstimator {
    client: Arc<dyn ChainReadClient>,
    gateway: Address,
}

impl GatewayFeeEstimator {
    /// Creates an estimator reading quotes from the given gateway contract.
    #[must_use]
    pub fn new(client: Arc<dyn ChainReadClient>, gateway: Address) -> Self {
        Self { client, gateway }
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, TransactionError> {
        let response = self
            .client
            .read_contract(self.gateway, call.abi_encode().into(), None)
            .await?;
        C::abi_decode_returns(&response)
            .map_err(|e| TransactionError::FeeEstimation(anyhow::anyhow!("{e}")))
    }
}

#[async_trait]
impl BridgeFeeEstimator for GatewayFeeEstimator {
    async fn message_gas_limit(
        &self,
        dest_chain_id: u64,
        message: &CrossChainMessage,
    ) -> Result<u64, TransactionError> {
        self.read(IGateway::messageGasLimitCall {
            centrifugeId: dest_chain_id,
            payload: message.payload.clone(),
        })
        .await
    }

    async fn max_batch_gas_limit(&self, dest_chain_id: u64) -> Result<u64, TransactionError> {
        self.read(IGateway::maxBatchGasLimitCall {
            centrifugeId: dest_chain_id,
        })
        .await
    }

    async fn batch_fee(
        &self,
        dest_chain_id: u64,
        batch_gas: u64,
    ) -> Result<U256, TransactionError> {
        self.read(IGateway::estimateCall {
            centrifugeId: dest_chain_id,
            batchGas: batch_gas,
        })
        .await
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;
    use crate::rpc::{LogFilter, RawLog};

    #[derive(Debug, Default)]
    struct RecordingReader {
        calls: Mutex<Vec<(Address, Bytes)>>,
    }

    #[async_trait]
    impl ChainReadClient for RecordingReader {
        fn chain_id(&self) -> u64 {
            1
        }

        async fn read_contract(
            &self,
            address: Address,
            call_data: Bytes,
            _block: Option<u64>,
        ) -> Result<Vec<u8>, RpcClientError> {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push((address, call_data));
            Ok(IERC20::balanceOfCall::abi_encode_returns(&U256::from(42)))
        }

        async fn get_logs(&self, _filter: &LogFilter) -> Result<Vec<RawLog>, RpcClientError> {
            Ok(vec![])
        }

        async fn block_number(&self) -> Result<u64, RpcClientError> {
            Ok(1)
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_reader_forwards_owned_call_data() {
        let client = Arc::new(RecordingReader::default());
        let reader = ContractReader::new(Arc::clone(&client) as Arc<dyn ChainReadClient>);
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let account = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let balance = reader.erc20_balance(token, account).await.unwrap();

        assert_eq!(balance, U256::from(42));
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, token);
        assert_eq!(
            &calls[0].1[..4],
            IERC20::balanceOfCall::SELECTOR.as_slice()
        );
    }

    #[rstest]
    fn test_multicall_encoding_roundtrip() {
        let payloads = vec![
            Bytes::from(vec![0xAA, 0xBB]),
            Bytes::from(vec![0xCC]),
        ];
        let encoded = encode_contract_multicall(&payloads);

        let decoded = ISelfMulticall::multicallCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.data, payloads);
    }

    #[rstest]
    fn test_approve_encoding_has_selector() {
        let spender = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let encoded = encode_erc20_approve(spender, U256::from(1000));

        assert_eq!(&encoded[..4], IERC20::approveCall::SELECTOR);
        let decoded = IERC20::approveCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, U256::from(1000));
    }
}
