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

//! Root SDK client wiring the query cache, event multiplexer and chain clients together.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use centrifuge_model::{PoolId, chain::Chain};

use crate::{
    config::SdkConfig,
    entities::pool::Pool,
    events::EventMultiplexer,
    indexer::IndexerClient,
    ipfs::{IpfsClient, IpfsError},
    query::QueryCache,
    rpc::{ChainReadClient, HttpRpcClient, RpcClientError},
};

/// The root Centrifuge client.
///
/// Owns one query cache and one event multiplexer; every entity derived from a client shares
/// them, so equal reads deduplicate and each chain is watched at most once across the whole
/// client. Cloning is cheap and clones share all state.
#[derive(Debug, Clone)]
pub struct Centrifuge {
    config: Arc<SdkConfig>,
    cache: Arc<QueryCache>,
    multiplexer: Arc<EventMultiplexer>,
    indexer: IndexerClient,
    ipfs: IpfsClient,
    read_clients: Arc<Mutex<AHashMap<u64, Arc<dyn ChainReadClient>>>>,
}

impl Centrifuge {
    /// Creates a new client from the given configuration.
    pub fn new(config: SdkConfig) -> Result<Self, IpfsError> {
        let ipfs = IpfsClient::new(&config.ipfs_gateway_url)?;
        Ok(Self {
            cache: Arc::new(QueryCache::new(config.cache.reset_delay)),
            multiplexer: Arc::new(EventMultiplexer::new(config.poll_interval)),
            indexer: IndexerClient::new(config.indexer_url.clone()),
            ipfs,
            read_clients: Arc::new(Mutex::new(AHashMap::new())),
            config: Arc::new(config),
        })
    }

    /// The client's configuration.
    #[must_use]
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The shared query cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// The shared event multiplexer.
    #[must_use]
    pub fn multiplexer(&self) -> &Arc<EventMultiplexer> {
        &self.multiplexer
    }

    /// The indexer client.
    #[must_use]
    pub fn indexer(&self) -> &IndexerClient {
        &self.indexer
    }

    /// The IPFS gateway client.
    #[must_use]
    pub fn ipfs(&self) -> &IpfsClient {
        &self.ipfs
    }

    /// Returns the read client for a chain, constructing it on first use.
    ///
    /// The endpoint comes from the config override when present, otherwise from the built-in
    /// chain table.
    pub fn read_client(&self, chain_id: u64) -> Result<Arc<dyn ChainReadClient>, RpcClientError> {
        let mut clients = self.read_clients.lock().expect("client lock poisoned");
        if let Some(client) = clients.get(&chain_id) {
            return Ok(Arc::clone(client));
        }

        let rpc_url = match self.config.rpc_url_for(chain_id) {
            Some(url) => url.to_string(),
            None => Chain::from_chain_id(chain_id)
                .and_then(|chain| chain.rpc_url.clone())
                .ok_or(RpcClientError::UnsupportedChain(chain_id))?,
        };

        let client: Arc<dyn ChainReadClient> = Arc::new(HttpRpcClient::new(chain_id, rpc_url));
        clients.insert(chain_id, Arc::clone(&client));
        Ok(client)
    }

    /// Returns the entity for the given pool.
    #[must_use]
    pub fn pool(&self, id: PoolId) -> Pool {
        Pool::new(self.clone(), id)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::Environment;

    #[rstest]
    fn test_read_clients_are_shared_per_chain() {
        let client = Centrifuge::new(SdkConfig::new(Environment::Mainnet)).unwrap();

        let first = client.read_client(1).unwrap();
        let second = client.read_client(1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[rstest]
    fn test_unknown_chain_without_override_is_rejected() {
        let client = Centrifuge::new(SdkConfig::default()).unwrap();

        assert!(matches!(
            client.read_client(999_999),
            Err(RpcClientError::UnsupportedChain(999_999)),
        ));
    }

    #[rstest]
    fn test_rpc_override_takes_precedence() {
        let mut config = SdkConfig::default();
        config
            .rpc_urls
            .push((999_999, "https://example.org/rpc".to_string()));
        let client = Centrifuge::new(config).unwrap();

        assert!(client.read_client(999_999).is_ok());
    }
}
