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

//! Chain definitions for the EVM networks the protocol is deployed on.

use std::{str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Represents the EVM networks with protocol deployments.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialOrd,
    PartialEq,
    Ord,
    Eq,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[non_exhaustive]
#[strum(ascii_case_insensitive)]
pub enum Network {
    Arbitrum,
    ArbitrumSepolia,
    Avalanche,
    Base,
    BaseSepolia,
    Celo,
    Ethereum,
    Plume,
    Sepolia,
}

/// Defines a blockchain with its unique identifiers and connection details for network interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// The blockchain network type.
    pub name: Network,
    /// The unique identifier for this blockchain.
    pub chain_id: u64,
    /// URL endpoint for the default RPC connection.
    pub rpc_url: Option<String>,
    /// The number of decimals for the native currency.
    pub native_currency_decimals: u8,
    /// Whether this chain is a testnet deployment.
    pub is_testnet: bool,
}

/// A thread-safe shared pointer to a `Chain`, enabling efficient reuse across multiple components.
pub type SharedChain = Arc<Chain>;

impl Chain {
    /// Creates a new [`Chain`] instance with the specified network and chain ID.
    #[must_use]
    pub fn new(name: Network, chain_id: u64) -> Self {
        Self {
            name,
            chain_id,
            rpc_url: None,
            native_currency_decimals: 18, // Default to 18 for EVM chains
            is_testnet: false,
        }
    }

    /// Sets the RPC URL endpoint.
    pub fn set_rpc_url(&mut self, rpc: String) {
        self.rpc_url = Some(rpc);
    }

    /// Returns the chain with the default RPC endpoint set.
    #[must_use]
    pub fn with_rpc_url(mut self, rpc: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc.into());
        self
    }

    /// Returns a reference to the `Chain` corresponding to the given `chain_id`, or `None` if it
    /// is not found.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Option<&'static Self> {
        match chain_id {
            1 => Some(&chains::ETHEREUM),
            8453 => Some(&chains::BASE),
            42161 => Some(&chains::ARBITRUM),
            42220 => Some(&chains::CELO),
            43114 => Some(&chains::AVALANCHE),
            98866 => Some(&chains::PLUME),
            11155111 => Some(&chains::SEPOLIA),
            84532 => Some(&chains::BASE_SEPOLIA),
            421614 => Some(&chains::ARBITRUM_SEPOLIA),
            _ => None,
        }
    }

    /// Returns a reference to the `Chain` corresponding to the given chain name, or `None` if it
    /// is not found.
    ///
    /// String matching is case-insensitive.
    #[must_use]
    pub fn from_chain_name(chain_name: &str) -> Option<&'static Self> {
        let network = Network::from_str(chain_name).ok()?;

        match network {
            Network::Arbitrum => Some(&chains::ARBITRUM),
            Network::ArbitrumSepolia => Some(&chains::ARBITRUM_SEPOLIA),
            Network::Avalanche => Some(&chains::AVALANCHE),
            Network::Base => Some(&chains::BASE),
            Network::BaseSepolia => Some(&chains::BASE_SEPOLIA),
            Network::Celo => Some(&chains::CELO),
            Network::Ethereum => Some(&chains::ETHEREUM),
            Network::Plume => Some(&chains::PLUME),
            Network::Sepolia => Some(&chains::SEPOLIA),
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.chain_id)
    }
}

/// Static chain definitions for all supported deployments.
pub mod chains {
    use std::sync::LazyLock;

    use super::{Chain, Network};

    /// Ethereum mainnet.
    pub static ETHEREUM: LazyLock<Chain> = LazyLock::new(|| {
        Chain::new(Network::Ethereum, 1).with_rpc_url("https://ethereum-rpc.publicnode.com")
    });
    /// Base mainnet.
    pub static BASE: LazyLock<Chain> =
        LazyLock::new(|| Chain::new(Network::Base, 8453).with_rpc_url("https://mainnet.base.org"));
    /// Arbitrum One.
    pub static ARBITRUM: LazyLock<Chain> = LazyLock::new(|| {
        Chain::new(Network::Arbitrum, 42161).with_rpc_url("https://arb1.arbitrum.io/rpc")
    });
    /// Celo mainnet.
    pub static CELO: LazyLock<Chain> =
        LazyLock::new(|| Chain::new(Network::Celo, 42220).with_rpc_url("https://forno.celo.org"));
    /// Avalanche C-Chain.
    pub static AVALANCHE: LazyLock<Chain> = LazyLock::new(|| {
        Chain::new(Network::Avalanche, 43114)
            .with_rpc_url("https://api.avax.network/ext/bc/C/rpc")
    });
    /// Plume mainnet.
    pub static PLUME: LazyLock<Chain> =
        LazyLock::new(|| Chain::new(Network::Plume, 98866).with_rpc_url("https://rpc.plume.org"));
    /// Ethereum Sepolia testnet.
    pub static SEPOLIA: LazyLock<Chain> = LazyLock::new(|| {
        let mut chain = Chain::new(Network::Sepolia, 11155111)
            .with_rpc_url("https://ethereum-sepolia-rpc.publicnode.com");
        chain.is_testnet = true;
        chain
    });
    /// Base Sepolia testnet.
    pub static BASE_SEPOLIA: LazyLock<Chain> = LazyLock::new(|| {
        let mut chain =
            Chain::new(Network::BaseSepolia, 84532).with_rpc_url("https://sepolia.base.org");
        chain.is_testnet = true;
        chain
    });
    /// Arbitrum Sepolia testnet.
    pub static ARBITRUM_SEPOLIA: LazyLock<Chain> = LazyLock::new(|| {
        let mut chain = Chain::new(Network::ArbitrumSepolia, 421614)
            .with_rpc_url("https://sepolia-rollup.arbitrum.io/rpc");
        chain.is_testnet = true;
        chain
    });
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, Network::Ethereum)]
    #[case(8453, Network::Base)]
    #[case(42161, Network::Arbitrum)]
    #[case(11155111, Network::Sepolia)]
    fn test_from_chain_id(#[case] chain_id: u64, #[case] expected: Network) {
        let chain = Chain::from_chain_id(chain_id).unwrap();
        assert_eq!(chain.name, expected);
        assert_eq!(chain.chain_id, chain_id);
    }

    #[rstest]
    fn test_from_chain_id_unknown() {
        assert!(Chain::from_chain_id(999_999).is_none());
    }

    #[rstest]
    #[case("ethereum")]
    #[case("Ethereum")]
    #[case("ETHEREUM")]
    fn test_from_chain_name_case_insensitive(#[case] name: &str) {
        let chain = Chain::from_chain_name(name).unwrap();
        assert_eq!(chain.name, Network::Ethereum);
    }

    #[rstest]
    fn test_every_network_has_default_rpc_url() {
        use strum::IntoEnumIterator;

        for network in Network::iter() {
            let chain = Chain::from_chain_name(&network.to_string()).unwrap();
            assert!(
                chain.rpc_url.is_some(),
                "missing default RPC endpoint for {network}"
            );
        }
    }

    #[rstest]
    fn test_testnet_flag() {
        assert!(!Chain::from_chain_id(1).unwrap().is_testnet);
        assert!(Chain::from_chain_id(11155111).unwrap().is_testnet);
    }

    #[rstest]
    fn test_display() {
        let chain = Chain::new(Network::Base, 8453);
        assert_eq!(chain.to_string(), "Base(8453)");
    }
}
