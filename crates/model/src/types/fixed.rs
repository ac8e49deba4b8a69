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

//! Functions for handling fixed-point arithmetic.
//!
//! This module provides constants and functions that enforce a fixed-point precision strategy,
//! ensuring consistent precision and scaling across value types and calculations.

use alloy_primitives::U256;

/// The maximum fixed-point precision.
///
/// On-chain rates use 27 decimals, the widest representation the protocol emits.
pub const FIXED_PRECISION: u8 = 27;

/// The number of decimals used for share prices.
pub const PRICE_DECIMALS: u8 = 18;

/// The number of decimals used for interest rates.
pub const RATE_DECIMALS: u8 = 27;

/// Checks if a given `precision` value is within the allowed fixed-point precision range.
///
/// # Errors
///
/// This function returns an error:
/// - If `precision` exceeds [`FIXED_PRECISION`].
pub fn check_fixed_precision(precision: u8) -> anyhow::Result<()> {
    if precision > FIXED_PRECISION {
        anyhow::bail!(
            "`precision` exceeded maximum `FIXED_PRECISION` ({FIXED_PRECISION}), was {precision}"
        )
    }
    Ok(())
}

/// Returns `10^precision` as a [`U256`] scaling factor.
///
/// # Panics
///
/// This function panics:
/// - If `precision` exceeds [`FIXED_PRECISION`].
#[must_use]
pub fn pow10(precision: u8) -> U256 {
    check_fixed_precision(precision).expect("fixed precision exceeded");
    U256::from(10u64).pow(U256::from(precision))
}

/// Converts a raw fixed-point [`U256`] value to an `f64` with the specified precision.
///
/// Lossy for values wider than the `f64` mantissa; intended for display and reporting only,
/// never for protocol arithmetic.
///
/// # Panics
///
/// This function panics:
/// - If `precision` exceeds [`FIXED_PRECISION`].
#[must_use]
pub fn fixed_u256_to_f64(raw: U256, precision: u8) -> f64 {
    let scale = pow10(precision);
    // scale <= 10^27 so the remainder always fits in a u128
    let integer = u128::try_from(raw / scale).map_or(f64::MAX, |v| v as f64);
    let frac = (raw % scale).to::<u128>() as f64;
    integer + frac / scale.to::<u128>() as f64
}

/// Converts an `f64` value to a raw fixed-point [`U256`] representation with the specified
/// precision.
///
/// # Errors
///
/// This function returns an error:
/// - If `precision` exceeds [`FIXED_PRECISION`].
/// - If `value` is negative or not finite.
pub fn f64_to_fixed_u256(value: f64, precision: u8) -> anyhow::Result<U256> {
    check_fixed_precision(precision)?;
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("`value` must be finite and non-negative, was {value}")
    }
    let scaled = value * 10f64.powi(i32::from(precision));
    Ok(U256::from(scaled.round()))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(18)]
    #[case(27)]
    fn test_valid_precision(#[case] precision: u8) {
        assert!(check_fixed_precision(precision).is_ok());
    }

    #[rstest]
    fn test_invalid_precision() {
        assert!(check_fixed_precision(28).is_err());
    }

    #[rstest]
    fn test_round_trip_f64() {
        let raw = f64_to_fixed_u256(1.5, 18).unwrap();
        assert_eq!(raw, U256::from(1_500_000_000_000_000_000u128));
        assert!((fixed_u256_to_f64(raw, 18) - 1.5).abs() < f64::EPSILON);
    }

    #[rstest]
    fn test_negative_rejected() {
        assert!(f64_to_fixed_u256(-1.0, 18).is_err());
        assert!(f64_to_fixed_u256(f64::NAN, 18).is_err());
    }
}
