//! Tick math used to turn a V4 liquidity delta into token amounts.
//!
//! V4 `ModifyLiquidity` only reports a liquidity delta and a tick range; the
//! token amounts moved are derived here from the pool's current tick, the
//! same way Uniswap's `LiquidityAmounts` library does. f64 precision is enough
//! for accounting at the decimal scales involved.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::conversion::f64_to_bigint;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// Upper bound on liquidity values we trust in f64 math.
const MAX_LIQUIDITY: f64 = 1e35;

// 1.0001^(-0.5 * 2^i) for i = 0..19, matching the bit decomposition in TickMath.sol
const TICK_MULTIPLIERS: [f64; 20] = [
    0.9999500037496876,
    0.9999000099990001,
    0.9998000299960005,
    0.9996000999800035,
    0.9992003598800331,
    0.9984013591843877,
    0.9968052740212325,
    0.9936207543165446,
    0.9872822034085791,
    0.9747261491672988,
    0.9500910658705113,
    0.9026730334469643,
    0.8148186053123443,
    0.6639293595631539,
    0.4408021944899397,
    0.1943065746671466,
    0.0377550449588794,
    0.0014254434198470,
    0.0000020318889432,
    0.0000000000041286,
];

/// sqrt(1.0001^tick), not scaled by Q96.
pub fn tick_to_sqrt_price(tick: i32) -> f64 {
    let clamped = tick.clamp(MIN_TICK, MAX_TICK);
    let abs_tick = clamped.unsigned_abs();

    let ratio = TICK_MULTIPLIERS
        .iter()
        .enumerate()
        .filter(|(bit, _)| abs_tick & (1 << bit) != 0)
        .fold(1.0_f64, |acc, (_, multiplier)| acc * multiplier);

    if clamped > 0 {
        1.0 / ratio
    } else {
        ratio
    }
}

/// amount0 = L * (1/sqrt_a - 1/sqrt_b)
fn amount0_for_liquidity(liquidity: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    let (lower, upper) = if sqrt_a > sqrt_b { (sqrt_b, sqrt_a) } else { (sqrt_a, sqrt_b) };
    if lower <= 0.0 {
        return 0.0;
    }
    let amount = liquidity * (1.0 / lower - 1.0 / upper);
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// amount1 = L * (sqrt_b - sqrt_a)
fn amount1_for_liquidity(liquidity: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    let amount = liquidity * (sqrt_a - sqrt_b).abs();
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Raw token amounts moved by a liquidity change of `liquidity_delta` over
/// `[tick_lower, tick_upper)` with the pool at `current_tick`.
///
/// The returned amounts carry the sign of the delta: adding liquidity moves
/// tokens into the pool (positive), removing moves them out (negative).
/// Malformed ranges yield zero amounts.
pub fn amounts_for_liquidity_delta(
    liquidity_delta: &BigInt,
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
) -> (BigInt, BigInt) {
    let zero = (BigInt::default(), BigInt::default());
    if tick_lower >= tick_upper || tick_lower < MIN_TICK || tick_upper > MAX_TICK {
        return zero;
    }

    let Some(delta) = liquidity_delta.to_f64() else {
        return zero;
    };
    let liquidity = delta.abs();
    if !liquidity.is_finite() || liquidity == 0.0 || liquidity > MAX_LIQUIDITY {
        return zero;
    }

    let sqrt_lower = tick_to_sqrt_price(tick_lower);
    let sqrt_upper = tick_to_sqrt_price(tick_upper);

    let (amount0, amount1) = if current_tick < tick_lower {
        (amount0_for_liquidity(liquidity, sqrt_lower, sqrt_upper), 0.0)
    } else if current_tick >= tick_upper {
        (0.0, amount1_for_liquidity(liquidity, sqrt_lower, sqrt_upper))
    } else {
        let sqrt_current = tick_to_sqrt_price(current_tick);
        (
            amount0_for_liquidity(liquidity, sqrt_current, sqrt_upper),
            amount1_for_liquidity(liquidity, sqrt_lower, sqrt_current),
        )
    };

    let sign = if delta < 0.0 { -1.0 } else { 1.0 };
    (f64_to_bigint(amount0 * sign), f64_to_bigint(amount1 * sign))
}
