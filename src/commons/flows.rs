//! Flow, volume and fee accounting for a single event.
//!
//! Amounts are signed from the pool's perspective: positive flows into the
//! pool, negative flows out. All functions here are pure and total.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use once_cell::sync::Lazy;

use crate::{
    db::models::{Token, VolumeConvention},
    utils::{floor_div, to_decimal},
};

/// Fee rates are parts per million: 1_000_000 = 100%.
static FEE_DENOMINATOR: Lazy<BigInt> = Lazy::new(|| BigInt::from(1_000_000u32));

/// Token movements of one event, decimal scaled, with USD values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowResult {
    pub inflow_token0: BigDecimal,
    pub inflow_token1: BigDecimal,
    pub inflow_usd: BigDecimal,
    pub outflow_token0: BigDecimal,
    pub outflow_token1: BigDecimal,
    pub outflow_usd: BigDecimal,
    pub net_inflow_token0: BigDecimal,
    pub net_inflow_token1: BigDecimal,
    pub net_inflow_usd: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapVolume {
    pub volume_token0: BigDecimal,
    pub volume_token0_usd: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_token1_usd: BigDecimal,
    pub volume_usd: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapFees {
    pub fee_token0: BigDecimal,
    pub fee_token1: BigDecimal,
    pub fees_usd: BigDecimal,
}

fn positive_part(value: &BigDecimal) -> BigDecimal {
    if value.is_positive() {
        value.clone()
    } else {
        BigDecimal::zero()
    }
}

fn negative_part_abs(value: &BigDecimal) -> BigDecimal {
    if value.is_negative() {
        value.abs()
    } else {
        BigDecimal::zero()
    }
}

/// Split raw signed amounts into inflow, outflow and net inflow.
///
/// Both amounts positive is a valid input (e.g. a mint) and is not special-cased.
pub fn get_liquidity_inflow_and_outflow_from_raw_amounts(
    amount0: &BigInt,
    amount1: &BigInt,
    token0: &Token,
    token1: &Token,
) -> FlowResult {
    let net_inflow_token0 = to_decimal(amount0, token0.decimals);
    let net_inflow_token1 = to_decimal(amount1, token1.decimals);

    let inflow_token0 = positive_part(&net_inflow_token0);
    let inflow_token1 = positive_part(&net_inflow_token1);
    let outflow_token0 = negative_part_abs(&net_inflow_token0);
    let outflow_token1 = negative_part_abs(&net_inflow_token1);

    FlowResult {
        inflow_usd: &inflow_token0 * &token0.price_usd + &inflow_token1 * &token1.price_usd,
        outflow_usd: &outflow_token0 * &token0.price_usd + &outflow_token1 * &token1.price_usd,
        net_inflow_usd: &net_inflow_token0 * &token0.price_usd
            + &net_inflow_token1 * &token1.price_usd,
        inflow_token0,
        inflow_token1,
        outflow_token0,
        outflow_token1,
        net_inflow_token0,
        net_inflow_token1,
    }
}

fn volume_from_legs(
    leg0: BigDecimal,
    leg1: BigDecimal,
    token0: &Token,
    token1: &Token,
) -> SwapVolume {
    let volume_token0_usd = &leg0 * &token0.price_usd;
    let volume_token1_usd = &leg1 * &token1.price_usd;
    SwapVolume {
        volume_usd: &volume_token0_usd + &volume_token1_usd,
        volume_token0: leg0,
        volume_token0_usd,
        volume_token1: leg1,
        volume_token1_usd,
    }
}

/// Concentrated liquidity volume: counts the legs flowing into the pool.
///
/// Takes decimal scaled signed amounts. Sums both legs if both are positive.
pub fn get_swap_volume_from_amounts(
    amount0: &BigDecimal,
    amount1: &BigDecimal,
    token0: &Token,
    token1: &Token,
) -> SwapVolume {
    volume_from_legs(positive_part(amount0), positive_part(amount1), token0, token1)
}

/// Constant product volume: counts the legs leaving the pool, as absolute values.
pub fn get_v2_swap_volume_from_amounts(
    amount0: &BigDecimal,
    amount1: &BigDecimal,
    token0: &Token,
    token1: &Token,
) -> SwapVolume {
    volume_from_legs(negative_part_abs(amount0), negative_part_abs(amount1), token0, token1)
}

/// Volume under the pool family's convention.
pub fn get_swap_volume(
    convention: VolumeConvention,
    flows: &FlowResult,
    token0: &Token,
    token1: &Token,
) -> SwapVolume {
    match convention {
        VolumeConvention::InflowLeg => get_swap_volume_from_amounts(
            &flows.net_inflow_token0,
            &flows.net_inflow_token1,
            token0,
            token1,
        ),
        VolumeConvention::OutflowLeg => get_v2_swap_volume_from_amounts(
            &flows.net_inflow_token0,
            &flows.net_inflow_token1,
            token0,
            token1,
        ),
    }
}

/// `floor(raw_amount * fee_ppm / 1_000_000)` in integer arithmetic.
pub fn get_raw_fee_from_token_amount(raw_amount: &BigInt, fee_ppm: u32) -> BigInt {
    floor_div(&(raw_amount * BigInt::from(fee_ppm)), &FEE_DENOMINATOR)
}

/// Fees charged on the legs flowing into the pool.
pub fn get_swap_fees_from_raw_amounts(
    amount0: &BigInt,
    amount1: &BigInt,
    fee_ppm: u32,
    token0: &Token,
    token1: &Token,
) -> SwapFees {
    let fee_of = |amount: &BigInt, token: &Token| {
        if amount.is_positive() {
            to_decimal(&get_raw_fee_from_token_amount(amount, fee_ppm), token.decimals)
        } else {
            BigDecimal::zero()
        }
    };

    let fee_token0 = fee_of(amount0, token0);
    let fee_token1 = fee_of(amount1, token1);
    SwapFees {
        fees_usd: &fee_token0 * &token0.price_usd + &fee_token1 * &token1.price_usd,
        fee_token0,
        fee_token1,
    }
}
