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

//! Protocol identifier newtypes.

use std::{fmt::Display, str::FromStr};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents errors encountered while parsing protocol identifiers.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// Occurs when a numeric identifier cannot be parsed from its string form.
    #[error("Invalid numeric identifier '{0}'")]
    InvalidNumeric(String),
    /// Occurs when a hex-encoded identifier is malformed or has the wrong length.
    #[error("Invalid hex identifier '{0}'")]
    InvalidHex(String),
}

/// Identifies a pool across all chains of a deployment.
///
/// The upper 32 bits carry the id of the chain the pool was created on, the lower 32 bits a
/// per-chain counter, so pool ids never collide across chains.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl PoolId {
    /// Creates a new [`PoolId`] from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Creates a new [`PoolId`] from the originating centrifuge chain id and a local counter.
    #[must_use]
    pub const fn from_parts(centrifuge_id: u32, counter: u32) -> Self {
        Self(((centrifuge_id as u64) << 32) | counter as u64)
    }

    /// Returns the id of the chain the pool was created on.
    #[must_use]
    pub const fn centrifuge_id(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PoolId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| IdentifierError::InvalidNumeric(s.to_string()))
    }
}

impl From<u64> for PoolId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifies a share class within a pool as a 16-byte value.
///
/// Derived deterministically from the pool id and a one-based share class index.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ShareClassId(pub [u8; 16]);

impl ShareClassId {
    /// Derives the share class id for the given pool and one-based index.
    #[must_use]
    pub fn new(pool_id: PoolId, index: u32) -> Self {
        let mut bytes = [0u8; 16];
        bytes[4..12].copy_from_slice(&pool_id.raw().to_be_bytes());
        bytes[12..16].copy_from_slice(&index.to_be_bytes());
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn raw(&self) -> [u8; 16] {
        self.0
    }
}

impl Display for ShareClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for ShareClassId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| IdentifierError::InvalidHex(s.to_string()))?;
        let raw: [u8; 16] = bytes
            .try_into()
            .map_err(|_| IdentifierError::InvalidHex(s.to_string()))?;
        Ok(Self(raw))
    }
}

impl From<ShareClassId> for String {
    fn from(id: ShareClassId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ShareClassId {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Identifies a registered investment asset across chains.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AssetId(pub u128);

impl AssetId {
    /// Creates a new [`AssetId`] from a raw value.
    #[must_use]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(&self) -> u128 {
        self.0
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| IdentifierError::InvalidNumeric(s.to_string()))
    }
}

/// Identifies an investor by wallet address.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestorAccount(pub Address);

impl InvestorAccount {
    /// Creates a new [`InvestorAccount`] from an address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the wallet address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl Display for InvestorAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
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
    fn test_pool_id_parts_round_trip() {
        let id = PoolId::from_parts(7, 42);
        assert_eq!(id.centrifuge_id(), 7);
        assert_eq!(id.raw() & 0xFFFF_FFFF, 42);
    }

    #[rstest]
    fn test_pool_id_parse() {
        let id: PoolId = "281474976710698".parse().unwrap();
        assert_eq!(id, PoolId::from_parts(65536, 42));
        assert!("not-a-number".parse::<PoolId>().is_err());
    }

    #[rstest]
    fn test_share_class_id_deterministic() {
        let pool = PoolId::new(1);
        assert_eq!(ShareClassId::new(pool, 1), ShareClassId::new(pool, 1));
        assert_ne!(ShareClassId::new(pool, 1), ShareClassId::new(pool, 2));
    }

    #[rstest]
    fn test_share_class_id_display_round_trip() {
        let id = ShareClassId::new(PoolId::from_parts(3, 9), 1);
        let display = id.to_string();
        assert!(display.starts_with("0x"));
        assert_eq!(display.len(), 34); // 0x + 32 hex chars (16 bytes)
        assert_eq!(display.parse::<ShareClassId>().unwrap(), id);
    }

    #[rstest]
    #[case("0xdeadbeef")] // Too short
    #[case("zz")]
    fn test_share_class_id_invalid(#[case] input: &str) {
        assert!(input.parse::<ShareClassId>().is_err());
    }
}
