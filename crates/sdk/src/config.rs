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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Deployment environment the SDK targets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production deployments on mainnets.
    #[default]
    Mainnet,
    /// Test deployments on public testnets.
    Testnet,
    /// Ephemeral deployments on local development chains.
    Demo,
}

/// Lifetime tuning for the query cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cache entry outlives its last subscriber.
    pub reset_delay: Duration,
    /// Default hard expiry for cached values; `None` keeps values until torn down.
    pub value_cache_time: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_secs(2),
            value_cache_time: None,
        }
    }
}

/// Configuration for a [`Centrifuge`](crate::client::Centrifuge) client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Which deployment environment to resolve chains and contracts against.
    pub environment: Environment,
    /// Per-chain RPC endpoint overrides, keyed by chain id; chains without an override use the
    /// built-in public endpoint.
    #[serde(default)]
    pub rpc_urls: Vec<(u64, String)>,
    /// Indexer GraphQL endpoint.
    pub indexer_url: String,
    /// IPFS gateway base URL for metadata fetches.
    pub ipfs_gateway_url: String,
    /// Interval at which chain log watchers poll for new blocks.
    pub poll_interval: Duration,
    /// Query cache tuning.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl SdkConfig {
    /// Creates a config for the given environment with default endpoints.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            rpc_urls: Vec::new(),
            indexer_url: "https://indexer.centrifuge.io/graphql".to_string(),
            ipfs_gateway_url: "https://centrifuge.mypinata.cloud".to_string(),
            poll_interval: Duration::from_secs(12),
            cache: CacheConfig::default(),
        }
    }

    /// Returns the RPC endpoint override for a chain, if configured.
    #[must_use]
    pub fn rpc_url_for(&self, chain_id: u64) -> Option<&str> {
        self.rpc_urls
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, url)| url.as_str())
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self::new(Environment::Mainnet)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("mainnet", Environment::Mainnet)]
    #[case("testnet", Environment::Testnet)]
    #[case("demo", Environment::Demo)]
    fn test_environment_parsing(#[case] input: &str, #[case] expected: Environment) {
        assert_eq!(input.parse::<Environment>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    fn test_rpc_override_lookup() {
        let mut config = SdkConfig::default();
        config.rpc_urls.push((1, "https://example.org/rpc".to_string()));

        assert_eq!(config.rpc_url_for(1), Some("https://example.org/rpc"));
        assert_eq!(config.rpc_url_for(8453), None);
    }
}
