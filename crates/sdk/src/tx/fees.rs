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

//! Cross-chain bridge fee estimation.

use ahash::AHashMap;
use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use centrifuge_model::CrossChainMessage;

use crate::tx::error::TransactionError;

/// Safety buffer applied to the summed raw fee estimate (×3/2).
const FEE_BUFFER_NUMERATOR: u64 = 3;
const FEE_BUFFER_DENOMINATOR: u64 = 2;

/// Source of per-message gas limits and per-batch bridge fee quotes, typically backed by the
/// gateway contract on each chain.
#[async_trait]
pub trait BridgeFeeEstimator: Send + Sync {
    /// Gas required to execute the given message on the destination chain.
    async fn message_gas_limit(
        &self,
        dest_chain_id: u64,
        message: &CrossChainMessage,
    ) -> Result<u64, TransactionError>;

    /// Maximum gas a single batch may consume on the destination chain.
    async fn max_batch_gas_limit(&self, dest_chain_id: u64) -> Result<u64, TransactionError>;

    /// Native-currency fee quote for relaying one batch consuming `batch_gas`.
    async fn batch_fee(&self, dest_chain_id: u64, batch_gas: u64)
    -> Result<U256, TransactionError>;
}

/// Estimates the total native-currency fee for relaying the given cross-chain messages.
///
/// Messages are grouped per destination chain by their batch key; each group's summed gas is
/// checked against the destination's batch limit, each group is quoted separately, and the
/// summed quotes carry a ×1.5 safety buffer so fee drift between estimation and submission does
/// not strand the transaction. Group order follows first appearance in the input, keeping quote
/// requests deterministic.
pub async fn estimate_batch_bridge_fee(
    estimator: &dyn BridgeFeeEstimator,
    messages: &AHashMap<u64, Vec<CrossChainMessage>>,
) -> Result<U256, TransactionError> {
    let mut total = U256::ZERO;

    let mut chain_ids: Vec<u64> = messages.keys().copied().collect();
    chain_ids.sort_unstable();

    for chain_id in chain_ids {
        let chain_messages = &messages[&chain_id];
        let limit = estimator.max_batch_gas_limit(chain_id).await?;

        let mut groups: Vec<(B256, u64)> = Vec::new();
        for message in chain_messages {
            let gas = estimator.message_gas_limit(chain_id, message).await?;
            let key = message.batch_key();
            match groups.iter_mut().find(|(group_key, _)| *group_key == key) {
                Some((_, sum)) => *sum = sum.saturating_add(gas),
                None => groups.push((key, gas)),
            }
        }

        for (_, gas) in &groups {
            if *gas > limit {
                return Err(TransactionError::BatchGasLimitExceeded {
                    gas: *gas,
                    limit,
                    chain_id,
                });
            }
            total += estimator.batch_fee(chain_id, *gas).await?;
        }
    }

    Ok(total * U256::from(FEE_BUFFER_NUMERATOR) / U256::from(FEE_BUFFER_DENOMINATOR))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;
    use rstest::rstest;

    use super::*;

    /// Estimator with per-message gas derived from payload length and a fixed per-batch quote.
    struct LengthEstimator {
        short_gas: u64,
        long_gas: u64,
        max_batch_gas: u64,
        fee: U256,
    }

    #[async_trait]
    impl BridgeFeeEstimator for LengthEstimator {
        async fn message_gas_limit(
            &self,
            _dest_chain_id: u64,
            message: &CrossChainMessage,
        ) -> Result<u64, TransactionError> {
            Ok(if message.payload.len() <= 9 {
                self.short_gas
            } else {
                self.long_gas
            })
        }

        async fn max_batch_gas_limit(&self, _dest_chain_id: u64) -> Result<u64, TransactionError> {
            Ok(self.max_batch_gas)
        }

        async fn batch_fee(
            &self,
            _dest_chain_id: u64,
            _batch_gas: u64,
        ) -> Result<U256, TransactionError> {
            Ok(self.fee)
        }
    }

    /// Two messages sharing one batch key prefix, distinguished by payload length.
    fn same_batch_messages() -> Vec<CrossChainMessage> {
        let prefix = [0x11u8; 9];
        let mut longer = prefix.to_vec();
        longer.push(0xFF);
        vec![
            CrossChainMessage::new(Bytes::from(prefix.to_vec())),
            CrossChainMessage::new(Bytes::from(longer)),
        ]
    }

    #[rstest]
    #[tokio::test]
    async fn test_fee_sum_applies_buffer() {
        // Gas 100 + 140 = 240 under the 500 limit; one group quoted at 777
        let estimator = LengthEstimator {
            short_gas: 100,
            long_gas: 140,
            max_batch_gas: 500,
            fee: U256::from(777),
        };
        let by_chain = AHashMap::from_iter([(2u64, same_batch_messages())]);

        let fee = estimate_batch_bridge_fee(&estimator, &by_chain).await.unwrap();
        assert_eq!(fee, U256::from(1165));
    }

    #[rstest]
    #[tokio::test]
    async fn test_batch_gas_over_limit_is_fatal() {
        struct OverLimitEstimator;

        #[async_trait]
        impl BridgeFeeEstimator for OverLimitEstimator {
            async fn message_gas_limit(
                &self,
                _dest_chain_id: u64,
                message: &CrossChainMessage,
            ) -> Result<u64, TransactionError> {
                Ok(if message.payload.len() <= 9 { 200 } else { 300 })
            }

            async fn max_batch_gas_limit(
                &self,
                _dest_chain_id: u64,
            ) -> Result<u64, TransactionError> {
                Ok(400)
            }

            async fn batch_fee(
                &self,
                _dest_chain_id: u64,
                _batch_gas: u64,
            ) -> Result<U256, TransactionError> {
                panic!("no quote may be requested for an over-limit batch");
            }
        }

        let by_chain = AHashMap::from_iter([(2u64, same_batch_messages())]);
        let error = estimate_batch_bridge_fee(&OverLimitEstimator, &by_chain)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Batch gas 500 exceeds limit 400 for chain 2");
        assert!(matches!(
            error,
            TransactionError::BatchGasLimitExceeded {
                gas: 500,
                limit: 400,
                chain_id: 2,
            }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_distinct_batch_keys_quoted_separately() {
        struct CountingEstimator {
            quotes: std::sync::atomic::AtomicUsize,
        }

        #[async_trait]
        impl BridgeFeeEstimator for CountingEstimator {
            async fn message_gas_limit(
                &self,
                _dest_chain_id: u64,
                _message: &CrossChainMessage,
            ) -> Result<u64, TransactionError> {
                Ok(10)
            }

            async fn max_batch_gas_limit(
                &self,
                _dest_chain_id: u64,
            ) -> Result<u64, TransactionError> {
                Ok(1000)
            }

            async fn batch_fee(
                &self,
                _dest_chain_id: u64,
                _batch_gas: u64,
            ) -> Result<U256, TransactionError> {
                self.quotes
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(U256::from(100))
            }
        }

        // Different discriminants produce different batch keys
        let messages = vec![
            CrossChainMessage::new(Bytes::from(vec![1u8; 9])),
            CrossChainMessage::new(Bytes::from(vec![2u8; 9])),
        ];
        let by_chain = AHashMap::from_iter([(1u64, messages)]);
        let estimator = CountingEstimator {
            quotes: std::sync::atomic::AtomicUsize::new(0),
        };

        let fee = estimate_batch_bridge_fee(&estimator, &by_chain).await.unwrap();
        assert_eq!(estimator.quotes.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(fee, U256::from(300));
    }

    #[rstest]
    #[tokio::test]
    async fn test_empty_messages_cost_nothing() {
        struct NeverEstimator;

        #[async_trait]
        impl BridgeFeeEstimator for NeverEstimator {
            async fn message_gas_limit(
                &self,
                _dest_chain_id: u64,
                _message: &CrossChainMessage,
            ) -> Result<u64, TransactionError> {
                unreachable!()
            }

            async fn max_batch_gas_limit(
                &self,
                _dest_chain_id: u64,
            ) -> Result<u64, TransactionError> {
                unreachable!()
            }

            async fn batch_fee(
                &self,
                _dest_chain_id: u64,
                _batch_gas: u64,
            ) -> Result<U256, TransactionError> {
                unreachable!()
            }
        }

        let fee = estimate_batch_bridge_fee(&NeverEstimator, &AHashMap::new())
            .await
            .unwrap();
        assert_eq!(fee, U256::ZERO);
    }
}
