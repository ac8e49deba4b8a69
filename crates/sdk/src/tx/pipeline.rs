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

//! Transaction orchestration.
//!
//! A pipeline run turns a caller-supplied sequence of signing and submission steps into an
//! ordered status stream. The step future runs on its own task and emits statuses through a
//! capacity-one channel, so it suspends at every status until the downstream consumer has taken
//! it; step N+1's side effects are never initiated before step N's terminal status is observed.
//! Failures surface as stream errors, never as status values.

use std::{future::Future, sync::Arc};

use alloy_primitives::{Bytes, U256};
use futures::Stream;
use tokio::sync::mpsc;

use crate::{
    contracts::encode_contract_multicall,
    rpc::{ChainReadClient, ChainWriteClient, RpcClientError, TransactionRequest},
    tx::{
        context::{BatchedTransactionDescriptor, TransactionContext},
        error::TransactionError,
        fees::{BridgeFeeEstimator, estimate_batch_bridge_fee},
        status::OperationStatus,
    },
};

/// Drives multi-step transaction runs against one wallet, in immediate or batching mode.
#[derive(Clone)]
pub struct TransactionPipeline {
    read: Arc<dyn ChainReadClient>,
    write: Arc<dyn ChainWriteClient>,
    fee_estimator: Arc<dyn BridgeFeeEstimator>,
}

impl std::fmt::Debug for TransactionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionPipeline")
            .field("chain_id", &self.read.chain_id())
            .finish()
    }
}

impl TransactionPipeline {
    /// Creates a pipeline for the chain served by the given clients.
    #[must_use]
    pub fn new(
        read: Arc<dyn ChainReadClient>,
        write: Arc<dyn ChainWriteClient>,
        fee_estimator: Arc<dyn BridgeFeeEstimator>,
    ) -> Self {
        Self {
            read,
            write,
            fee_estimator,
        }
    }

    /// Runs the given steps in immediate mode: each wrapped call submits and confirms before
    /// the next step resumes.
    pub fn transact<F, Fut>(
        &self,
        steps: F,
    ) -> impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<F, Fut>
    where
        F: FnOnce(TransactionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TransactionError>> + Send + 'static,
    {
        self.run(false, steps)
    }

    /// Runs the given steps in batching mode: wrapped calls accumulate as descriptors, and once
    /// the step future returns, the descriptors are merged and submitted together.
    ///
    /// Calls on one shared target merge into a single `multicall`, turning N signature prompts
    /// into one. Calls on distinct targets are first attempted as an atomic wallet batch; a
    /// wallet without that capability gets them sequentially, while an explicit wallet rejection
    /// of the batch is fatal.
    pub fn transact_batched<F, Fut>(
        &self,
        steps: F,
    ) -> impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<F, Fut>
    where
        F: FnOnce(TransactionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TransactionError>> + Send + 'static,
    {
        self.run(true, steps)
    }

    /// Runs a flat list of sequential sub-transactions sharing one context.
    pub fn transact_sequence(
        &self,
        requests: Vec<(String, TransactionRequest)>,
    ) -> impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<> {
        self.transact(move |ctx| async move {
            for (title, request) in requests {
                ctx.do_transaction(title, request).await?;
            }
            Ok(())
        })
    }

    fn run<F, Fut>(
        &self,
        batching: bool,
        steps: F,
    ) -> impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<F, Fut>
    where
        F: FnOnce(TransactionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TransactionError>> + Send + 'static,
    {
        let chain_id = self.read.chain_id();
        let read = Arc::clone(&self.read);
        let write = Arc::clone(&self.write);
        let fee_estimator = Arc::clone(&self.fee_estimator);

        // Cold until first poll: no chain switch or signature request happens for a stream that
        // is never consumed.
        async_stream::stream! {
            let (sender, mut receiver) = mpsc::channel(1);
            let driver = tokio::spawn(async move {
                let ctx = TransactionContext::new(
                    chain_id,
                    read,
                    write,
                    Arc::clone(&fee_estimator),
                    sender,
                    batching,
                );
                ctx.ensure_chain().await?;

                let exec_ctx = ctx.clone().with_batching(false);
                steps(ctx).await?;

                if batching {
                    execute_batch(&exec_ctx, fee_estimator.as_ref()).await?;
                }
                Ok::<(), TransactionError>(())
            });

            while let Some(status) = receiver.recv().await {
                yield Ok(status);
            }
            match driver.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => yield Err(error),
                Err(join_error) => yield Err(TransactionError::Pipeline(join_error.to_string())),
            }
        }
    }
}

/// Merges accumulated batch descriptors and submits them.
async fn execute_batch(
    ctx: &TransactionContext,
    fee_estimator: &dyn BridgeFeeEstimator,
) -> Result<(), TransactionError> {
    let descriptors = ctx.take_batched();
    let Some(first) = descriptors.first() else {
        return Ok(());
    };

    if descriptors
        .iter()
        .all(|descriptor| descriptor.contract == first.contract)
    {
        // One shared target: merge every payload and message into a single submission
        let mut messages = ahash::AHashMap::new();
        let mut payloads = Vec::new();
        let mut value = U256::ZERO;
        for descriptor in &descriptors {
            payloads.extend(descriptor.payloads.iter().cloned());
            value += descriptor.value;
            for (dest, msgs) in &descriptor.messages {
                messages
                    .entry(*dest)
                    .or_insert_with(Vec::new)
                    .extend(msgs.iter().cloned());
            }
        }
        let fee = estimate_batch_bridge_fee(fee_estimator, &messages).await?;
        let data = merge_payloads(payloads);
        let request = TransactionRequest::new(first.contract, data).with_value(value + fee);
        ctx.do_transaction("Execute batch", request).await?;
        return Ok(());
    }

    // Distinct targets: each descriptor becomes its own request carrying its own bridge fee,
    // since sequential fallback relays each call's messages separately
    let mut requests = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let fee = estimate_batch_bridge_fee(fee_estimator, &descriptor.messages).await?;
        requests.push(request_for(descriptor, fee));
    }

    match ctx.do_atomic_batch("Execute batch", &requests).await {
        Ok(_) => Ok(()),
        Err(TransactionError::Rpc(RpcClientError::UnsupportedCapability(capability))) => {
            tracing::debug!("Wallet lacks {capability}, submitting batch sequentially");
            for (step, request) in requests.into_iter().enumerate() {
                ctx.do_transaction(format!("Execute batch step {}", step + 1), request)
                    .await?;
            }
            Ok(())
        }
        Err(error) => Err(error),
    }
}

fn merge_payloads(mut payloads: Vec<Bytes>) -> Bytes {
    if payloads.len() == 1 {
        payloads.remove(0)
    } else {
        encode_contract_multicall(&payloads)
    }
}

fn request_for(descriptor: &BatchedTransactionDescriptor, fee: U256) -> TransactionRequest {
    let data = merge_payloads(descriptor.payloads.clone());
    TransactionRequest::new(descriptor.contract, data).with_value(descriptor.value + fee)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
