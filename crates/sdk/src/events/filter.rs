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

use alloy_primitives::{Address, B256, keccak256};

use crate::rpc::RawLog;

/// Restricts which emitting contracts a filter matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AddressFilter {
    /// Match logs from any contract on the chain.
    #[default]
    All,
    /// Match only logs emitted by one of the given contracts.
    Only(Vec<Address>),
}

impl AddressFilter {
    fn matches(&self, address: &Address) -> bool {
        match self {
            Self::All => true,
            Self::Only(addresses) => addresses.contains(address),
        }
    }
}

/// A client-side predicate over decoded chain logs.
///
/// Topic entries accept either a Solidity event signature (`Transfer(address,address,uint256)`)
/// or an already-hashed 32-byte topic in hex; both normalize to the same keccak-256 form at
/// construction so equality of predicates is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilterSpec {
    /// Chain the filter observes.
    pub chain_id: u64,
    /// Emitting-contract restriction.
    pub addresses: AddressFilter,
    /// Accepted topic0 values; empty accepts every event.
    pub topics: Vec<B256>,
}

impl EventFilterSpec {
    /// Creates a filter for the given chain matching all contracts and events.
    #[must_use]
    pub fn for_chain(chain_id: u64) -> Self {
        Self {
            chain_id,
            addresses: AddressFilter::All,
            topics: Vec::new(),
        }
    }

    /// Restricts the filter to logs emitted by the given contracts.
    #[must_use]
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = AddressFilter::Only(addresses);
        self
    }

    /// Adds an accepted event, given either a signature or a pre-hashed topic.
    #[must_use]
    pub fn with_event(mut self, signature_or_topic: &str) -> Self {
        self.topics.push(normalize_topic(signature_or_topic));
        self
    }

    /// Returns whether the given log satisfies this predicate.
    #[must_use]
    pub fn matches(&self, log: &RawLog) -> bool {
        if !self.addresses.matches(&log.address) {
            return false;
        }
        if self.topics.is_empty() {
            return true;
        }
        log.topics
            .first()
            .is_some_and(|topic0| self.topics.contains(topic0))
    }
}

/// Normalizes an event signature or hex-encoded topic hash into a 32-byte topic.
#[must_use]
pub fn normalize_topic(sig: &str) -> B256 {
    let s = sig.trim();

    // Already a hashed topic, with or without the 0x prefix
    let hex_part = s.strip_prefix("0x").unwrap_or(s);
    if hex_part.len() == 64
        && hex_part.chars().all(|c| c.is_ascii_hexdigit())
        && let Ok(bytes) = hex::decode(hex_part)
    {
        return B256::from_slice(&bytes);
    }

    // Otherwise a raw signature that needs hashing
    keccak256(s.as_bytes())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::{Bytes, address, b256};
    use rstest::rstest;

    use super::*;

    const TRANSFER_TOPIC: B256 =
        b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

    fn log_with(address: Address, topic0: Option<B256>) -> RawLog {
        RawLog {
            address,
            topics: topic0.into_iter().collect(),
            data: Bytes::new(),
            block_number: 100,
            transaction_hash: B256::ZERO,
            log_index: 0,
        }
    }

    #[rstest]
    #[case("Transfer(address,address,uint256)")]
    #[case("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")]
    #[case("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")]
    #[case("  Transfer(address,address,uint256)  ")]
    fn test_normalize_topic_forms_agree(#[case] input: &str) {
        assert_eq!(normalize_topic(input), TRANSFER_TOPIC);
    }

    #[rstest]
    fn test_normalize_topic_uppercase_hex() {
        assert_eq!(
            normalize_topic("0xDDF252AD1BE2C89B69C2B068FC378DAA952BA7F163C4A11628F55A4DF523B3EF"),
            TRANSFER_TOPIC,
        );
    }

    #[rstest]
    fn test_signature_and_hash_match_same_logs() {
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let log = log_with(token, Some(TRANSFER_TOPIC));

        let by_signature = EventFilterSpec::for_chain(1)
            .with_addresses(vec![token])
            .with_event("Transfer(address,address,uint256)");
        let by_hash = EventFilterSpec::for_chain(1)
            .with_addresses(vec![token])
            .with_event("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

        assert_eq!(by_signature, by_hash);
        assert!(by_signature.matches(&log));
        assert!(by_hash.matches(&log));
    }

    #[rstest]
    fn test_address_filter_rejects_other_contracts() {
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let other = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
        let spec = EventFilterSpec::for_chain(1).with_addresses(vec![token]);

        assert!(spec.matches(&log_with(token, Some(TRANSFER_TOPIC))));
        assert!(!spec.matches(&log_with(other, Some(TRANSFER_TOPIC))));
    }

    #[rstest]
    fn test_empty_topics_match_any_event() {
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let spec = EventFilterSpec::for_chain(1);

        assert!(spec.matches(&log_with(token, Some(TRANSFER_TOPIC))));
        assert!(spec.matches(&log_with(token, None)));
    }

    #[rstest]
    fn test_topic_filter_requires_topic0() {
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let spec = EventFilterSpec::for_chain(1).with_event("Transfer(address,address,uint256)");

        assert!(spec.matches(&log_with(token, Some(TRANSFER_TOPIC))));
        assert!(!spec.matches(&log_with(token, Some(B256::ZERO))));
        assert!(!spec.matches(&log_with(token, None)));
    }
}
