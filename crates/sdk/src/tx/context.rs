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

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use ahash::AHashMap;
use alloy_primitives::{Address, Bytes, U256};
use centrifuge_model::CrossChainMessage;
use tokio::sync::mpsc;

use crate::{
    rpc::{ChainReadClient, ChainWriteClient, RpcClientError, TransactionReceipt, TransactionRequest},
    tx::{
        error::TransactionError,
        fees::{BridgeFeeEstimator, estimate_batch_bridge_fee},
        status::OperationStatus,
    },
};

/// A contract call a pipeline step wants performed, with any cross-chain messages it relays.
#[derive(Debug, Clone)]
pub struct WrappedCall {
    pub contract: Address,
    pub data: Bytes,
    pub value: U256,
    /// Cross-chain messages the call emits, keyed by destination chain id; their bridging fee is
    /// estimated and added to the transaction's native value.
    pub messages: AHashMap<u64, Vec<CrossChainMessage>>,
}

impl WrappedCall {
    /// Creates a call with no native value and no cross-chain messages.
    #[must_use]
    pub fn new(contract: Address, data: Bytes) -> Self {
        Self {
            contract,
            data,
            value: U256::ZERO,
            messages: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: AHashMap<u64, Vec<CrossChainMessage>>) -> Self {
        self.messages = messages;
        self
    }
}

/// A deferred contract call accumulated while the pipeline runs in batching mode, later merged
/// with its siblings into a single submission.
#[derive(Debug, Clone)]
pub struct BatchedTransactionDescriptor {
    pub contract: Address,
    pub payloads: Vec<Bytes>,
    pub value: U256,
    pub messages: AHashMap<u64, Vec<CrossChainMessage>>,
}

/// Per-run bundle threading the chain clients, status sink, and step counter through every
/// pipeline sub-step.
///
/// Clones share the status channel, step counter and batch accumulator, so a clone held by the
/// pipeline driver continues the same correlated status sequence the user's steps produced.
/// Never shared across concurrent runs.
#[derive(Clone)]
pub struct TransactionContext {
    chain_id: u64,
    read: Arc<dyn ChainReadClient>,
    write: Arc<dyn ChainWriteClient>,
    fee_estimator: Arc<dyn BridgeFeeEstimator>,
    sender: mpsc::Sender<OperationStatus>,
    step_counter: Arc<AtomicU64>,
    batching: bool,
    batched: Arc<Mutex<Vec<BatchedTransactionDescriptor>>>,
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("chain_id", &self.chain_id)
            .field("batching", &self.batching)
            .finish()
    }
}

impl TransactionContext {
    pub(crate) fn new(
        chain_id: u64,
        read: Arc<dyn ChainReadClient>,
        write: Arc<dyn ChainWriteClient>,
        fee_estimator: Arc<dyn BridgeFeeEstimator>,
        sender: mpsc::Sender<OperationStatus>,
        batching: bool,
    ) -> Self {
        Self {
            chain_id,
            read,
            write,
            fee_estimator,
            sender,
            step_counter: Arc::new(AtomicU64::new(0)),
            batching,
            batched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The chain this run operates on.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The signing address for this run.
    #[must_use]
    pub fn account(&self) -> Address {
        self.write.account()
    }

    /// Read client for the run's chain, for preflight contract reads inside steps.
    #[must_use]
    pub fn read_client(&self) -> &Arc<dyn ChainReadClient> {
        &self.read
    }

    /// Whether steps should defer their calls as batch descriptors.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batching
    }

    pub(crate) fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }

    pub(crate) fn take_batched(&self) -> Vec<BatchedTransactionDescriptor> {
        std::mem::take(&mut *self.batched.lock().expect("batch lock poisoned"))
    }

    fn next_step_id(&self) -> u64 {
        self.step_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Emits a status, suspending until the downstream consumer has made room for it.
    ///
    /// A detached consumer stops the run: no further sub-step may be initiated once status
    /// delivery is impossible.
    pub(crate) async fn emit(&self, status: OperationStatus) -> Result<(), TransactionError> {
        self.sender
            .send(status)
            .await
            .map_err(|_| TransactionError::Pipeline("status consumer detached".to_string()))
    }

    /// Switches the wallet to the run's chain if it is currently elsewhere.
    pub async fn ensure_chain(&self) -> Result<(), TransactionError> {
        let active = self.write.active_chain_id().await?;
        if active == self.chain_id {
            return Ok(());
        }
        self.emit(OperationStatus::SwitchingChain {
            chain_id: self.chain_id,
        })
        .await?;
        self.write.switch_chain(self.chain_id).await?;
        Ok(())
    }

    /// The atomic write primitive: one signature, one submission, one confirmation wait.
    ///
    /// Emits `SigningTransaction`, `TransactionPending`, then `TransactionConfirmed`; a wallet
    /// rejection errors before any pending status, and a reverted receipt errors carrying the
    /// receipt without a confirmed status.
    pub async fn do_transaction(
        &self,
        title: impl Into<String>,
        request: TransactionRequest,
    ) -> Result<TransactionReceipt, TransactionError> {
        let id = self.next_step_id();
        self.emit(OperationStatus::SigningTransaction {
            id,
            title: title.into(),
        })
        .await?;

        let hash = self
            .write
            .send_transaction(&request)
            .await
            .map_err(reject_or_rpc)?;
        self.emit(OperationStatus::TransactionPending { id, hash })
            .await?;

        let receipt = self.write.wait_for_receipt(hash).await?;
        if !receipt.status {
            return Err(TransactionError::Reverted { receipt });
        }
        self.emit(OperationStatus::TransactionConfirmed {
            id,
            receipt: receipt.clone(),
        })
        .await?;
        Ok(receipt)
    }

    /// Submits several requests as one atomic wallet batch.
    ///
    /// Capability is probed first, so an unsupported wallet fails before any status is emitted
    /// and the signing status always precedes the signature request; callers catch
    /// [`RpcClientError::UnsupportedCapability`] to fall back to sequential submission.
    pub async fn do_atomic_batch(
        &self,
        title: impl Into<String>,
        requests: &[TransactionRequest],
    ) -> Result<TransactionReceipt, TransactionError> {
        if !self.write.supports_atomic_batch().await? {
            return Err(TransactionError::Rpc(RpcClientError::UnsupportedCapability(
                "atomic batching".to_string(),
            )));
        }

        let id = self.next_step_id();
        self.emit(OperationStatus::SigningTransaction {
            id,
            title: title.into(),
        })
        .await?;

        let hash = self
            .write
            .send_atomic_batch(requests)
            .await
            .map_err(reject_or_rpc)?;
        self.emit(OperationStatus::TransactionPending { id, hash })
            .await?;

        let receipt = self.write.wait_for_receipt(hash).await?;
        if !receipt.status {
            return Err(TransactionError::Reverted { receipt });
        }
        self.emit(OperationStatus::TransactionConfirmed {
            id,
            receipt: receipt.clone(),
        })
        .await?;
        Ok(receipt)
    }

    /// Requests an off-chain typed-data signature from the wallet.
    ///
    /// Emits `SigningMessage` then `SignedMessage`; touches no chain state.
    pub async fn do_sign_message(
        &self,
        title: impl Into<String>,
        payload: &serde_json::Value,
    ) -> Result<Bytes, TransactionError> {
        let id = self.next_step_id();
        self.emit(OperationStatus::SigningMessage {
            id,
            title: title.into(),
        })
        .await?;

        let signed = self
            .write
            .sign_typed_data(payload)
            .await
            .map_err(reject_or_rpc)?;
        self.emit(OperationStatus::SignedMessage {
            id,
            signed: signed.clone(),
        })
        .await?;
        Ok(signed)
    }

    /// Performs the call immediately, or defers it as a batch descriptor when batching.
    ///
    /// In immediate mode any cross-chain bridging fee is estimated first and forwarded as the
    /// transaction's native value on top of the call's own value. Returns the receipt in
    /// immediate mode and `None` when the call was deferred.
    pub async fn wrap_transaction(
        &self,
        title: impl Into<String>,
        call: WrappedCall,
    ) -> Result<Option<TransactionReceipt>, TransactionError> {
        if self.batching {
            self.batched
                .lock()
                .expect("batch lock poisoned")
                .push(BatchedTransactionDescriptor {
                    contract: call.contract,
                    payloads: vec![call.data],
                    value: call.value,
                    messages: call.messages,
                });
            return Ok(None);
        }

        let fee = estimate_batch_bridge_fee(self.fee_estimator.as_ref(), &call.messages).await?;
        let request = TransactionRequest::new(call.contract, call.data).with_value(call.value + fee);
        let receipt = self.do_transaction(title, request).await?;
        Ok(Some(receipt))
    }
}

/// Maps a wallet rejection to its dedicated error; other RPC failures pass through.
fn reject_or_rpc(error: RpcClientError) -> TransactionError {
    match error {
        RpcClientError::Rejected(reason) => TransactionError::SigningRejected(reason),
        other => TransactionError::Rpc(other),
    }
}
