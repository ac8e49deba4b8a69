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

use thiserror::Error;

use crate::rpc::{RpcClientError, TransactionReceipt};

/// Errors raised during a transaction pipeline run.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The on-chain receipt reported failure; carries the receipt for caller inspection.
    #[error("Transaction {} reverted in block {}", receipt.transaction_hash, receipt.block_number)]
    Reverted { receipt: TransactionReceipt },
    /// The wallet declined to sign; no pending status was emitted for the step.
    #[error("Signature rejected: {0}")]
    SigningRejected(String),
    /// Summed gas for a cross-chain batch exceeds the destination chain's configured maximum.
    #[error("Batch gas {gas} exceeds limit {limit} for chain {chain_id}")]
    BatchGasLimitExceeded { gas: u64, limit: u64, chain_id: u64 },
    /// Fee estimation failed before any signature was requested.
    #[error("Bridge fee estimation failed: {0}")]
    FeeEstimation(anyhow::Error),
    /// An underlying RPC call failed.
    #[error(transparent)]
    Rpc(#[from] RpcClientError),
    /// The pipeline driver task failed outside a step.
    #[error("Pipeline run failed: {0}")]
    Pipeline(String),
}
