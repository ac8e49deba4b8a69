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

use alloy_primitives::{B256, Bytes};
use strum::Display;

use crate::rpc::TransactionReceipt;

/// One point in a transaction run's lifecycle.
///
/// Failure is never a status value: a failed step surfaces as a stream error, so consumers use
/// ordinary completion/error semantics instead of inspecting payloads for failure. Step-scoped
/// statuses carry the identifier of their logical step so `SigningTransaction` and
/// `TransactionConfirmed` of the same step correlate across a multi-step run.
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum OperationStatus {
    /// The wallet is being switched to the target chain before any step proceeds.
    SwitchingChain { chain_id: u64 },
    /// An off-chain signature has been requested from the wallet.
    SigningMessage { id: u64, title: String },
    /// The off-chain signature was produced.
    SignedMessage { id: u64, signed: Bytes },
    /// A transaction signature has been requested from the wallet.
    SigningTransaction { id: u64, title: String },
    /// The transaction was submitted and awaits inclusion.
    TransactionPending { id: u64, hash: B256 },
    /// The transaction was included and succeeded; terminal for its step.
    TransactionConfirmed {
        id: u64,
        receipt: TransactionReceipt,
    },
}

impl OperationStatus {
    /// The logical step this status belongs to, if step-scoped.
    #[must_use]
    pub fn step_id(&self) -> Option<u64> {
        match self {
            Self::SwitchingChain { .. } => None,
            Self::SigningMessage { id, .. }
            | Self::SignedMessage { id, .. }
            | Self::SigningTransaction { id, .. }
            | Self::TransactionPending { id, .. }
            | Self::TransactionConfirmed { id, .. } => Some(*id),
        }
    }
}
