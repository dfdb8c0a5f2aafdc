//! Numeric conversions and decimal helpers.
//!
//! Raw on-chain amounts are kept as `BigInt` and scaled to `BigDecimal` by the
//! token's decimals. Multiplication and addition stay exact; division is the
//! only lossy operation and always rounds to [`DIVISION_SCALE`] fractional
//! digits so chained percentage math is reproducible.

use alloy::primitives::{hex, I256, U256};
use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, Zero};
use once_cell::sync::Lazy;

/// Fractional digits kept by [`div_decimal`].
pub const DIVISION_SCALE: i64 = 20;

// ============================================
// Hex Encoding
// ============================================

/// Encode bytes as a lowercase hex string with 0x prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ============================================
// Integer Conversions
// ============================================

/// Convert an unsigned alloy U256 into a BigInt.
pub fn u256_to_bigint(value: U256) -> BigInt {
    let bytes: [u8; 32] = value.to_le_bytes();
    BigInt::from_bytes_le(Sign::Plus, &bytes)
}

/// Convert a signed alloy I256 into a BigInt, preserving the sign.
pub fn i256_to_bigint(value: I256) -> BigInt {
    let bytes: [u8; 32] = value.into_raw().to_le_bytes();
    BigInt::from_signed_bytes_le(&bytes)
}

/// Truncate an f64 raw amount (tick math output) into a BigInt.
/// Non-finite inputs map to zero.
pub fn f64_to_bigint(value: f64) -> BigInt {
    if !value.is_finite() {
        return BigInt::zero();
    }
    BigInt::from_f64(value.trunc()).unwrap_or_default()
}

// ============================================
// Decimal Conversions
// ============================================

/// Scale a raw token amount by `10^decimals`.
///
/// Exact: `BigDecimal` stores the raw integer with `decimals` as its scale, so
/// no rounding happens here.
pub fn to_decimal(raw: &BigInt, decimals: u8) -> BigDecimal {
    BigDecimal::new(raw.clone(), decimals as i64)
}

/// Divide two decimals, rounding HALF_UP to [`DIVISION_SCALE`] digits.
/// Division by zero yields zero.
pub fn div_decimal(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        return BigDecimal::zero();
    }
    (numerator / denominator).with_scale_round(DIVISION_SCALE, RoundingMode::HalfUp)
}

/// Floor division on integers (rounds toward negative infinity).
pub fn floor_div(numerator: &BigInt, denominator: &BigInt) -> BigInt {
    if denominator.is_zero() {
        return BigInt::zero();
    }
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if !remainder.is_zero() && (remainder.sign() != denominator.sign()) {
        quotient - 1
    } else {
        quotient
    }
}

static ONE_HUNDRED: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(100i64));

/// 100 as a decimal, for percentage conversions.
pub(crate) fn one_hundred() -> &'static BigDecimal {
    &ONE_HUNDRED
}
