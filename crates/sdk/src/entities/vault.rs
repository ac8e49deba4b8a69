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

use std::sync::Arc;

use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, U256};
use centrifuge_model::PoolId;
use futures::{Stream, StreamExt};

use crate::{
    cache_key,
    client::Centrifuge,
    contracts::{ContractReader, IVault, encode_erc20_approve},
    events::EventFilterSpec,
    query::{Query, QueryError, QueryOptions},
    rpc::{ChainWriteClient, RpcClientError, TransactionRequest},
    tx::{
        BridgeFeeEstimator, OperationStatus, TransactionError, TransactionPipeline, WrappedCall,
    },
};

/// Entity for one tokenized vault on one chain.
///
/// Reads go through the shared query cache with event-driven invalidation; writes run through a
/// transaction pipeline constructed per call against the caller's wallet.
#[derive(Debug, Clone)]
pub struct Vault {
    client: Centrifuge,
    pool_id: PoolId,
    chain_id: u64,
    address: Address,
    asset: Address,
}

impl Vault {
    pub(crate) fn new(
        client: Centrifuge,
        pool_id: PoolId,
        chain_id: u64,
        address: Address,
        asset: Address,
    ) -> Self {
        Self {
            client,
            pool_id,
            chain_id,
            address,
            asset,
        }
    }

    /// The vault's contract address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The vault's investment asset.
    #[must_use]
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// The account's asset balance, recomputed whenever a Transfer touching the asset lands.
    ///
    /// All consumers asking for the same account share one balance read and one chain watcher.
    pub fn asset_balance(&self, account: Address) -> Result<Query<U256>, RpcClientError> {
        let read = self.client.read_client(self.chain_id)?;
        let reader = ContractReader::new(Arc::clone(&read));
        let asset = self.asset;
        let multiplexer = Arc::clone(self.client.multiplexer());
        let filter = EventFilterSpec::for_chain(self.chain_id)
            .with_addresses(vec![asset])
            .with_event("Transfer(address,address,uint256)");

        Ok(self.client.cache().query(
            Some(cache_key!("asset-balance", self.chain_id, asset, account)),
            move || {
                let reader = reader.clone();
                multiplexer
                    .repeat_on_events(Arc::clone(&read), filter.clone(), move || {
                        let reader = reader.clone();
                        Box::pin(async move {
                            reader
                                .erc20_balance(asset, account)
                                .await
                                .map_err(anyhow::Error::from)
                        })
                    })
                    .boxed()
            },
            QueryOptions::default(),
        ))
    }

    /// The maximum amount the account can currently deposit, per the vault contract.
    pub fn max_deposit(&self, account: Address) -> Result<Query<U256>, RpcClientError> {
        let read = self.client.read_client(self.chain_id)?;
        let reader = ContractReader::new(read);
        let vault = self.address;

        Ok(self.client.cache().query(
            Some(cache_key!("max-deposit", self.chain_id, vault, account)),
            move || {
                let reader = reader.clone();
                Box::pin(async_stream::stream! {
                    yield fetch_max_deposit(&reader, vault, account).await;
                })
            },
            QueryOptions::default(),
        ))
    }

    /// Places a deposit request for `amount` of the vault's asset.
    ///
    /// Runs in batching mode: the ERC-20 approval and the deposit request merge into a single
    /// signature when both target the same contract, otherwise the wallet's atomic batching
    /// capability is tried before sequential submission. The returned stream yields each step's
    /// status in order.
    pub fn invest(
        &self,
        amount: U256,
        wallet: Arc<dyn ChainWriteClient>,
        fee_estimator: Arc<dyn BridgeFeeEstimator>,
    ) -> Result<
        impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<>,
        RpcClientError,
    > {
        let read = self.client.read_client(self.chain_id)?;
        let account = wallet.account();
        let vault = self.address;
        let asset = self.asset;
        let pool_id = self.pool_id;
        let pipeline = TransactionPipeline::new(read, wallet, fee_estimator);

        Ok(pipeline.transact_batched(move |ctx| async move {
            tracing::debug!("Investing {amount} into pool {pool_id} vault {vault}");

            ctx.wrap_transaction(
                "Approve asset",
                WrappedCall::new(asset, encode_erc20_approve(vault, amount)),
            )
            .await?;

            let deposit = IVault::requestDepositCall {
                assets: amount,
                controller: account,
                owner: account,
            };
            ctx.wrap_transaction(
                "Request deposit",
                WrappedCall::new(vault, Bytes::from(deposit.abi_encode())),
            )
            .await?;
            Ok(())
        }))
    }

    /// Claims shares for a previously fulfilled deposit request.
    ///
    /// Claiming never relays cross-chain messages, so the step runs as a plain sequential
    /// transaction rather than through the batching path.
    pub fn claim_deposit(
        &self,
        amount: U256,
        wallet: Arc<dyn ChainWriteClient>,
        fee_estimator: Arc<dyn BridgeFeeEstimator>,
    ) -> Result<
        impl Stream<Item = Result<OperationStatus, TransactionError>> + Send + 'static + use<>,
        RpcClientError,
    > {
        let read = self.client.read_client(self.chain_id)?;
        let receiver = wallet.account();
        let pipeline = TransactionPipeline::new(read, wallet, fee_estimator);

        let claim = IVault::depositCall {
            assets: amount,
            receiver,
        };
        let request = TransactionRequest::new(self.address, Bytes::from(claim.abi_encode()));
        Ok(pipeline.transact_sequence(vec![("Claim deposit".to_string(), request)]))
    }

    /// Convenience one-shot read of the account's asset balance.
    pub async fn asset_balance_once(&self, account: Address) -> Result<U256, QueryError> {
        let query = self
            .asset_balance(account)
            .map_err(|e| QueryError::factory(anyhow::Error::from(e)))?;
        query.await
    }
}

async fn fetch_max_deposit(
    reader: &ContractReader,
    vault: Address,
    account: Address,
) -> anyhow::Result<U256> {
    let call = IVault::maxDepositCall { receiver: account };
    let response = reader.call(vault, call.abi_encode().into(), None).await?;
    IVault::maxDepositCall::abi_decode_returns(&response)
        .map_err(|e| anyhow::anyhow!("failed to decode maxDeposit: {e}"))
}
