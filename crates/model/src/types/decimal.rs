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

//! A single fixed-point decimal value type for on-chain amounts, prices and rates.
//!
//! The protocol's numeric quantities (currency amounts, share amounts, prices, rates) all share
//! one representation: an unsigned raw integer scaled by a per-value decimals count. Rather than
//! a type hierarchy, [`FixedDecimal`] is one value type with named constructors for the semantic
//! flavors; arithmetic across mismatched scales is a checked error, never silent rescaling.

use std::{cmp::Ordering, fmt::Display};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::fixed::{
    PRICE_DECIMALS, RATE_DECIMALS, check_fixed_precision, f64_to_fixed_u256, fixed_u256_to_f64,
    pow10,
};

/// Represents errors from fixed-point decimal arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecimalError {
    /// Occurs when combining two values with different decimals counts.
    #[error("Decimals mismatch: {lhs} vs {rhs}")]
    DecimalsMismatch {
        /// Decimals of the left-hand operand.
        lhs: u8,
        /// Decimals of the right-hand operand.
        rhs: u8,
    },
    /// Occurs when an operation overflows the 256-bit raw representation.
    #[error("Arithmetic overflow")]
    Overflow,
    /// Occurs when dividing by a zero value.
    #[error("Division by zero")]
    DivisionByZero,
}

/// An unsigned fixed-point decimal backed by a 256-bit raw integer and a decimals count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedDecimal {
    /// The raw scaled integer value.
    raw: U256,
    /// The number of decimal places the raw value is scaled by.
    decimals: u8,
}

impl FixedDecimal {
    /// Creates a new [`FixedDecimal`] from a raw scaled value and decimals count.
    ///
    /// # Panics
    ///
    /// Panics if `decimals` exceeds the supported fixed-point precision.
    #[must_use]
    pub fn from_raw(raw: U256, decimals: u8) -> Self {
        check_fixed_precision(decimals).expect("fixed precision exceeded");
        Self { raw, decimals }
    }

    /// Creates a currency amount in the denomination of an asset with the given decimals.
    #[must_use]
    pub fn currency(raw: U256, decimals: u8) -> Self {
        Self::from_raw(raw, decimals)
    }

    /// Creates a share amount in the denomination of a share class token.
    #[must_use]
    pub fn shares(raw: U256, decimals: u8) -> Self {
        Self::from_raw(raw, decimals)
    }

    /// Creates a share price (18 decimals).
    #[must_use]
    pub fn price(raw: U256) -> Self {
        Self::from_raw(raw, PRICE_DECIMALS)
    }

    /// Creates an interest rate (27 decimals).
    #[must_use]
    pub fn rate(raw: U256) -> Self {
        Self::from_raw(raw, RATE_DECIMALS)
    }

    /// Creates a value from an `f64`, rounding to the given decimals.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, not finite, or the decimals count is
    /// unsupported.
    pub fn from_f64(value: f64, decimals: u8) -> anyhow::Result<Self> {
        Ok(Self {
            raw: f64_to_fixed_u256(value, decimals)?,
            decimals,
        })
    }

    /// Returns the raw scaled value.
    #[must_use]
    pub const fn raw(&self) -> U256 {
        self.raw
    }

    /// Returns the decimals count.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Returns the value as an `f64` (lossy; for display and reporting only).
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        fixed_u256_to_f64(self.raw, self.decimals)
    }

    /// Rescales the value to a different decimals count, truncating when narrowing.
    #[must_use]
    pub fn to_decimals(&self, decimals: u8) -> Self {
        if decimals == self.decimals {
            return *self;
        }
        let raw = if decimals > self.decimals {
            self.raw * pow10(decimals - self.decimals)
        } else {
            self.raw / pow10(self.decimals - decimals)
        };
        Self::from_raw(raw, decimals)
    }

    /// Adds two values of the same scale.
    ///
    /// # Errors
    ///
    /// Returns an error on decimals mismatch or overflow.
    pub fn checked_add(&self, other: &Self) -> Result<Self, DecimalError> {
        self.check_same_decimals(other)?;
        let raw = self
            .raw
            .checked_add(other.raw)
            .ok_or(DecimalError::Overflow)?;
        Ok(Self::from_raw(raw, self.decimals))
    }

    /// Subtracts another value of the same scale.
    ///
    /// # Errors
    ///
    /// Returns an error on decimals mismatch or underflow.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, DecimalError> {
        self.check_same_decimals(other)?;
        let raw = self
            .raw
            .checked_sub(other.raw)
            .ok_or(DecimalError::Overflow)?;
        Ok(Self::from_raw(raw, self.decimals))
    }

    /// Multiplies by a price or rate, keeping this value's scale.
    ///
    /// `amount.checked_mul(price)` computes `amount * price / 10^price.decimals`, i.e. a token
    /// amount times a share price yields an amount in the same denomination.
    ///
    /// # Errors
    ///
    /// Returns an error on overflow.
    pub fn checked_mul(&self, factor: &Self) -> Result<Self, DecimalError> {
        let scaled = self
            .raw
            .checked_mul(factor.raw)
            .ok_or(DecimalError::Overflow)?;
        Ok(Self::from_raw(scaled / pow10(factor.decimals), self.decimals))
    }

    /// Divides by a price or rate, keeping this value's scale.
    ///
    /// # Errors
    ///
    /// Returns an error on overflow or division by zero.
    pub fn checked_div(&self, divisor: &Self) -> Result<Self, DecimalError> {
        if divisor.raw.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        let scaled = self
            .raw
            .checked_mul(pow10(divisor.decimals))
            .ok_or(DecimalError::Overflow)?;
        Ok(Self::from_raw(scaled / divisor.raw, self.decimals))
    }

    fn check_same_decimals(&self, other: &Self) -> Result<(), DecimalError> {
        if self.decimals != other.decimals {
            return Err(DecimalError::DecimalsMismatch {
                lhs: self.decimals,
                rhs: other.decimals,
            });
        }
        Ok(())
    }
}

impl PartialOrd for FixedDecimal {
    /// Values of different scales are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.decimals != other.decimals {
            return None;
        }
        Some(self.raw.cmp(&other.raw))
    }
}

impl Display for FixedDecimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.raw);
        }
        let scale = pow10(self.decimals);
        let integer = self.raw / scale;
        let frac = self.raw % scale;
        write!(
            f,
            "{integer}.{frac:0width$}",
            width = self.decimals as usize
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn usdc(value: u64) -> FixedDecimal {
        FixedDecimal::currency(U256::from(value) * U256::from(1_000_000u64), 6)
    }

    #[rstest]
    fn test_add_sub_same_scale() {
        let sum = usdc(3).checked_add(&usdc(4)).unwrap();
        assert_eq!(sum, usdc(7));
        assert_eq!(sum.checked_sub(&usdc(2)).unwrap(), usdc(5));
    }

    #[rstest]
    fn test_mismatched_scale_rejected() {
        let other = FixedDecimal::currency(U256::from(1u64), 18);
        assert_eq!(
            usdc(1).checked_add(&other),
            Err(DecimalError::DecimalsMismatch { lhs: 6, rhs: 18 })
        );
    }

    #[rstest]
    fn test_underflow_rejected() {
        assert_eq!(usdc(1).checked_sub(&usdc(2)), Err(DecimalError::Overflow));
    }

    #[rstest]
    fn test_mul_by_price_keeps_scale() {
        // 100 USDC at a share price of 1.25 -> 125 USDC worth of shares
        let price = FixedDecimal::price(U256::from(1_250_000_000_000_000_000u128));
        let result = usdc(100).checked_mul(&price).unwrap();
        assert_eq!(result, usdc(125));
        assert_eq!(result.decimals(), 6);
    }

    #[rstest]
    fn test_div_by_price() {
        let price = FixedDecimal::price(U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(usdc(100).checked_div(&price).unwrap(), usdc(50));
    }

    #[rstest]
    fn test_div_by_zero() {
        let zero = FixedDecimal::price(U256::ZERO);
        assert_eq!(
            usdc(1).checked_div(&zero),
            Err(DecimalError::DivisionByZero)
        );
    }

    #[rstest]
    fn test_rescale_round_trip_widening() {
        let widened = usdc(42).to_decimals(18);
        assert_eq!(widened.decimals(), 18);
        assert_eq!(widened.to_decimals(6), usdc(42));
    }

    #[rstest]
    fn test_display() {
        assert_eq!(usdc(5).to_string(), "5.000000");
        let price = FixedDecimal::price(U256::from(1_250_000_000_000_000_000u128));
        assert_eq!(price.to_string(), "1.250000000000000000");
    }

    #[rstest]
    fn test_different_scales_unordered() {
        let a = usdc(1);
        let b = FixedDecimal::currency(U256::from(1u64), 18);
        assert!(a.partial_cmp(&b).is_none());
        assert!(usdc(1) < usdc(2));
    }
}
