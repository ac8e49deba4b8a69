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

//! Chain event multiplexing.
//!
//! Each chain gets at most one log watcher regardless of how many consumers filter its events.
//! The watcher polls `eth_getLogs` over unfiltered block ranges and broadcasts every batch;
//! consumers apply their [`EventFilterSpec`] predicates client-side, so adding a consumer never
//! changes the upstream request pattern.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use ahash::AHashMap;
use futures::{Stream, StreamExt, future::BoxFuture};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    events::filter::EventFilterSpec,
    rpc::{ChainReadClient, LogFilter, RawLog},
};

/// A batch of logs produced by one poll cycle, shared across all consumers.
pub type LogBatch = Arc<Vec<RawLog>>;

/// Broadcast buffer depth per chain; slow consumers past this lag skip batches.
const BROADCAST_CAPACITY: usize = 1024;

struct ChainWatcher {
    sender: broadcast::Sender<LogBatch>,
    task: JoinHandle<()>,
}

type WatcherMap = Arc<Mutex<AHashMap<u64, ChainWatcher>>>;

/// Multiplexes chain log subscriptions so each chain is watched exactly once.
pub struct EventMultiplexer {
    poll_interval: Duration,
    watchers: WatcherMap,
}

impl std::fmt::Debug for EventMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMultiplexer")
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl EventMultiplexer {
    /// Creates a new [`EventMultiplexer`] polling each watched chain at the given interval.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            watchers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribes to the raw log batches of the client's chain, starting its watcher on first use.
    pub fn subscribe_chain(
        &self,
        client: Arc<dyn ChainReadClient>,
    ) -> broadcast::Receiver<LogBatch> {
        let chain_id = client.chain_id();
        let mut watchers = self.watchers.lock().expect("watcher lock poisoned");

        if let Some(watcher) = watchers.get(&chain_id) {
            return watcher.sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(BROADCAST_CAPACITY);
        let task = tokio::spawn(poll_chain(
            client,
            sender.clone(),
            self.poll_interval,
            Arc::clone(&self.watchers),
        ));
        watchers.insert(chain_id, ChainWatcher { sender, task });
        tracing::debug!("Started log watcher for chain {chain_id}");
        receiver
    }

    /// Returns a stream of log batches matching the given filter.
    ///
    /// Batches with no matching log are skipped. Concurrent consumers on the same chain share
    /// one underlying watcher whatever their filters.
    pub fn filtered_events(
        &self,
        client: Arc<dyn ChainReadClient>,
        spec: EventFilterSpec,
    ) -> impl Stream<Item = Vec<RawLog>> + Send + 'static {
        let receiver = self.subscribe_chain(client);

        async_stream::stream! {
            let mut receiver = receiver;
            loop {
                match receiver.recv().await {
                    Ok(batch) => {
                        let matched: Vec<RawLog> = batch
                            .iter()
                            .filter(|log| spec.matches(log))
                            .cloned()
                            .collect();
                        if !matched.is_empty() {
                            yield matched;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Event consumer lagged, skipped {skipped} batches");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Produces a stream that yields the factory output immediately and recomputes it whenever
    /// a log matching the filter lands on chain.
    ///
    /// This is the event-driven invalidation primitive: wiring its output into a cached query
    /// keeps the buffered value current without any consumer-visible polling.
    pub fn repeat_on_events<T, F>(
        &self,
        client: Arc<dyn ChainReadClient>,
        spec: EventFilterSpec,
        factory: F,
    ) -> impl Stream<Item = anyhow::Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync + 'static,
    {
        let events = self.filtered_events(client, spec);

        async_stream::stream! {
            yield factory().await;

            let mut events = std::pin::pin!(events);
            while let Some(batch) = events.next().await {
                tracing::trace!("Recomputing after {} matching logs", batch.len());
                yield factory().await;
            }
        }
    }

    /// Number of chains currently being watched.
    #[must_use]
    pub fn watched_chains(&self) -> usize {
        self.watchers.lock().expect("watcher lock poisoned").len()
    }
}

impl Drop for EventMultiplexer {
    fn drop(&mut self) {
        let watchers = self.watchers.lock().expect("watcher lock poisoned");
        for watcher in watchers.values() {
            watcher.task.abort();
        }
    }
}

/// Polls new blocks on one chain and broadcasts each non-empty log batch.
///
/// Exits and removes itself from the watcher map once every receiver is gone, so the next
/// subscription starts a fresh watcher from the then-current head.
async fn poll_chain(
    client: Arc<dyn ChainReadClient>,
    sender: broadcast::Sender<LogBatch>,
    poll_interval: Duration,
    watchers: WatcherMap,
) {
    let chain_id = client.chain_id();
    let mut last_seen_block: Option<u64> = None;

    loop {
        tokio::time::sleep(poll_interval).await;

        if sender.receiver_count() == 0 {
            break;
        }

        let head = match client.block_number().await {
            Ok(head) => head,
            Err(error) => {
                tracing::warn!("Failed to fetch block number for chain {chain_id}: {error}");
                continue;
            }
        };

        let from_block = match last_seen_block {
            Some(last) if head <= last => continue,
            Some(last) => last + 1,
            None => {
                // First cycle establishes the baseline; historical logs are not replayed
                last_seen_block = Some(head);
                continue;
            }
        };

        let filter = LogFilter {
            from_block,
            to_block: head,
            addresses: None,
            topics: Vec::new(),
        };
        match client.get_logs(&filter).await {
            Ok(logs) => {
                last_seen_block = Some(head);
                if !logs.is_empty() && sender.send(Arc::new(logs)).is_err() {
                    break;
                }
            }
            Err(error) => {
                tracing::warn!("Failed to fetch logs for chain {chain_id}: {error}");
            }
        }
    }

    watchers
        .lock()
        .expect("watcher lock poisoned")
        .remove(&chain_id);
    tracing::debug!("Stopped log watcher for chain {chain_id}");
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use alloy_primitives::{Address, B256, Bytes, address};
    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::{events::filter::normalize_topic, rpc::RpcClientError};

    const POOL: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const OTHER: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");

    /// Fake chain advancing one block per poll, emitting one deposit log per new block.
    #[derive(Debug)]
    struct FakeChain {
        chain_id: u64,
        head: AtomicU64,
        get_logs_calls: AtomicUsize,
        emitter: Address,
    }

    impl FakeChain {
        fn new(chain_id: u64, emitter: Address) -> Self {
            Self {
                chain_id,
                head: AtomicU64::new(100),
                get_logs_calls: AtomicUsize::new(0),
                emitter,
            }
        }
    }

    #[async_trait]
    impl ChainReadClient for FakeChain {
        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        async fn read_contract(
            &self,
            _address: Address,
            _call_data: Bytes,
            _block: Option<u64>,
        ) -> Result<Vec<u8>, RpcClientError> {
            Ok(Vec::new())
        }

        async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcClientError> {
            self.get_logs_calls.fetch_add(1, Ordering::SeqCst);
            Ok((filter.from_block..=filter.to_block)
                .map(|block_number| RawLog {
                    address: self.emitter,
                    topics: vec![normalize_topic("Deposit(address,uint256)")],
                    data: Bytes::new(),
                    block_number,
                    transaction_hash: B256::ZERO,
                    log_index: 0,
                })
                .collect())
        }

        async fn block_number(&self) -> Result<u64, RpcClientError> {
            Ok(self.head.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_multiple_filters_share_one_chain_watcher() {
        let mux = EventMultiplexer::new(Duration::from_secs(1));
        let chain = Arc::new(FakeChain::new(1, POOL));

        let deposits = mux.filtered_events(
            Arc::clone(&chain) as Arc<dyn ChainReadClient>,
            EventFilterSpec::for_chain(1).with_event("Deposit(address,uint256)"),
        );
        let withdrawals = mux.filtered_events(
            Arc::clone(&chain) as Arc<dyn ChainReadClient>,
            EventFilterSpec::for_chain(1).with_event("Withdraw(address,uint256)"),
        );
        let mut deposits = std::pin::pin!(deposits);
        let _withdrawals = std::pin::pin!(withdrawals);

        assert_eq!(mux.watched_chains(), 1);

        let batch = deposits.next().await.unwrap();
        assert_eq!(batch.len(), 1);
        // Baseline poll plus one fetching poll, not one per consumer
        assert_eq!(chain.get_logs_calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_filter_excludes_non_matching_logs() {
        let mux = EventMultiplexer::new(Duration::from_secs(1));
        let chain = Arc::new(FakeChain::new(1, OTHER));

        let events = mux.filtered_events(
            chain as Arc<dyn ChainReadClient>,
            EventFilterSpec::for_chain(1)
                .with_addresses(vec![POOL])
                .with_event("Deposit(address,uint256)"),
        );
        let mut events = std::pin::pin!(events);

        let raced = tokio::time::timeout(Duration::from_secs(10), events.next()).await;
        assert!(raced.is_err(), "logs from other contracts must not surface");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_distinct_chains_get_distinct_watchers() {
        let mux = EventMultiplexer::new(Duration::from_secs(1));
        let mainnet = Arc::new(FakeChain::new(1, POOL));
        let base = Arc::new(FakeChain::new(8453, POOL));

        let _a = mux.subscribe_chain(mainnet as Arc<dyn ChainReadClient>);
        let _b = mux.subscribe_chain(base as Arc<dyn ChainReadClient>);

        assert_eq!(mux.watched_chains(), 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_repeat_on_events_recomputes_per_matching_batch() {
        let mux = EventMultiplexer::new(Duration::from_secs(1));
        let chain = Arc::new(FakeChain::new(1, POOL));
        let computations = Arc::new(AtomicUsize::new(0));

        let stream = mux.repeat_on_events(
            chain as Arc<dyn ChainReadClient>,
            EventFilterSpec::for_chain(1).with_event("Deposit(address,uint256)"),
            {
                let computations = Arc::clone(&computations);
                move || {
                    let computations = Arc::clone(&computations);
                    Box::pin(async move { Ok(computations.fetch_add(1, Ordering::SeqCst)) })
                }
            },
        );
        let mut stream = std::pin::pin!(stream);

        // Base value computed before any chain activity
        assert_eq!(stream.next().await.unwrap().unwrap(), 0);
        // Each matching batch triggers one recomputation
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
    }
}
