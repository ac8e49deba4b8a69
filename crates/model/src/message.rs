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

//! Cross-chain protocol message payloads.

use alloy_primitives::{B256, Bytes, keccak256};

/// Number of leading payload bytes that determine which gateway batch a message belongs to.
///
/// Messages open with a one-byte discriminant followed by the 8-byte pool id; the gateway relays
/// all messages sharing that prefix to a destination chain in a single batch.
const BATCH_KEY_PREFIX_LEN: usize = 9;

/// A serialized protocol message destined for another chain.
///
/// The payload encoding is owned by the on-chain messaging contracts; the SDK treats it as opaque
/// bytes and only inspects the leading prefix to group messages into gateway batches for fee
/// estimation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossChainMessage {
    /// The serialized message payload.
    pub payload: Bytes,
}

impl CrossChainMessage {
    /// Creates a new [`CrossChainMessage`] from a serialized payload.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns the one-byte message discriminant, or `None` for an empty payload.
    #[must_use]
    pub fn discriminant(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Returns the key of the gateway batch this message is relayed in.
    ///
    /// Derived from the payload's leading bytes so that messages the gateway delivers together
    /// share a key regardless of their full contents.
    #[must_use]
    pub fn batch_key(&self) -> B256 {
        let prefix_len = self.payload.len().min(BATCH_KEY_PREFIX_LEN);
        keccak256(&self.payload[..prefix_len])
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
    fn test_same_prefix_shares_batch_key() {
        let a = CrossChainMessage::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 7, 0xAA]);
        let b = CrossChainMessage::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 7, 0xBB, 0xCC]);
        assert_eq!(a.batch_key(), b.batch_key());
    }

    #[rstest]
    fn test_different_pool_differs() {
        let a = CrossChainMessage::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 7]);
        let b = CrossChainMessage::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 8]);
        assert_ne!(a.batch_key(), b.batch_key());
    }

    #[rstest]
    fn test_short_payload_uses_full_bytes() {
        let msg = CrossChainMessage::new(vec![4]);
        assert_eq!(msg.discriminant(), Some(4));
        assert_eq!(msg.batch_key(), keccak256([4u8]));
    }
}
