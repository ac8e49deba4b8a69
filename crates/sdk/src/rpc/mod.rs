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

//! Chain client capabilities consumed by the query and transaction layers.
//!
//! The read side (contract calls, log retrieval) is implemented in-process over HTTP JSON-RPC by
//! [`http::HttpRpcClient`]; the write side (wallet signing, transaction submission) is supplied by
//! the embedding application, since the SDK never holds key material itself.

use std::fmt::Debug;

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod http;

pub use error::RpcClientError;
pub use http::HttpRpcClient;

/// Defines the criteria for a log retrieval request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// First block of the queried range (inclusive).
    pub from_block: u64,
    /// Last block of the queried range (inclusive).
    pub to_block: u64,
    /// Contract addresses to restrict the query to, or `None` for all addresses.
    pub addresses: Option<Vec<Address>>,
    /// Event signature hashes (topic0) to restrict the query to; empty matches all events.
    pub topics: Vec<B256>,
}

/// A raw, undecoded log entry observed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// The contract address that emitted the log.
    pub address: Address,
    /// The indexed log topics; the first entry is the event signature hash.
    pub topics: Vec<B256>,
    /// The ABI-encoded non-indexed log data.
    pub data: Bytes,
    /// The number of the block containing the log.
    pub block_number: u64,
    /// The hash of the transaction that produced the log.
    pub transaction_hash: B256,
    /// The position of the log within its block.
    pub log_index: u64,
}

/// A transaction ready for wallet submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// The target contract address.
    pub to: Address,
    /// The ABI-encoded call data.
    pub data: Bytes,
    /// The native currency value attached to the call.
    pub value: U256,
}

impl TransactionRequest {
    /// Creates a new [`TransactionRequest`] with no attached value.
    #[must_use]
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
        }
    }

    /// Sets the attached native currency value.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// The receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// The hash of the mined transaction.
    pub transaction_hash: B256,
    /// The number of the block the transaction was included in.
    pub block_number: u64,
    /// Whether the transaction succeeded (`true`) or reverted (`false`).
    pub status: bool,
    /// The gas consumed by the transaction.
    pub gas_used: u64,
    /// The logs emitted by the transaction.
    pub logs: Vec<RawLog>,
}

/// Read-only chain access: contract calls, log retrieval and block height.
#[async_trait::async_trait]
pub trait ChainReadClient: Send + Sync + Debug {
    /// Returns the chain id this client is connected to.
    fn chain_id(&self) -> u64;

    /// Executes a read-only contract call and returns the raw response bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or response decoding fails.
    async fn read_contract(
        &self,
        address: Address,
        call_data: Bytes,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcClientError>;

    /// Retrieves the logs matching the given filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or the response cannot be parsed.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcClientError>;

    /// Returns the current block height.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    async fn block_number(&self) -> Result<u64, RpcClientError>;
}

/// Wallet-backed chain access: chain switching, signing and transaction submission.
///
/// One logical signer per instance; the transaction pipeline never drives two concurrent signing
/// flows through the same client without the caller's explicit intent.
#[async_trait::async_trait]
pub trait ChainWriteClient: Send + Sync + Debug {
    /// Returns the signing address.
    fn account(&self) -> Address;

    /// Returns the chain the wallet is currently active on.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet cannot be queried.
    async fn active_chain_id(&self) -> Result<u64, RpcClientError>;

    /// Switches the wallet to the given chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet rejects or does not know the chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), RpcClientError>;

    /// Signs and submits a transaction, returning its hash.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Rejected`] if the wallet declines to sign.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcClientError>;

    /// Signs an EIP-712 typed-data payload off-chain, returning the signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Rejected`] if the wallet declines to sign.
    async fn sign_typed_data(&self, payload: &serde_json::Value) -> Result<Bytes, RpcClientError>;

    /// Waits until the transaction with the given hash is mined and returns its receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be retrieved.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, RpcClientError>;

    /// Reports whether the wallet can submit atomic batches, without side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet cannot be queried.
    async fn supports_atomic_batch(&self) -> Result<bool, RpcClientError>;

    /// Submits multiple calls as one atomic wallet batch, returning the batch transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::UnsupportedCapability`] if the wallet cannot batch atomically,
    /// or [`RpcClientError::Rejected`] if the user declines.
    async fn send_atomic_batch(
        &self,
        requests: &[TransactionRequest],
    ) -> Result<B256, RpcClientError>;
}
