//! Fee yield annualization. Results are percentages.

use bigdecimal::BigDecimal;
use num_traits::Zero;
use once_cell::sync::Lazy;

use crate::utils::{div_decimal, one_hundred};

static DAYS_PER_YEAR: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(365u32));
static HOURS_PER_YEAR: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(24u32 * 365));

/// Fee yield of a single period: `fees / tvl * 100`. Zero when TVL is zero.
pub fn calculate_fee_yield(tvl_usd: &BigDecimal, fees_usd: &BigDecimal) -> BigDecimal {
    div_decimal(fees_usd, tvl_usd) * one_hundred()
}

/// Annualize one day of fees.
pub fn calculate_day_yearly_yield(tvl_usd: &BigDecimal, day_fees_usd: &BigDecimal) -> BigDecimal {
    if tvl_usd.is_zero() {
        return BigDecimal::zero();
    }
    div_decimal(day_fees_usd, tvl_usd) * &*DAYS_PER_YEAR * one_hundred()
}

/// Annualize one hour of fees.
pub fn calculate_hour_yearly_yield(tvl_usd: &BigDecimal, hour_fees_usd: &BigDecimal) -> BigDecimal {
    if tvl_usd.is_zero() {
        return BigDecimal::zero();
    }
    div_decimal(hour_fees_usd, tvl_usd) * &*HOURS_PER_YEAR * one_hundred()
}

/// Annualize a yield accumulated over `period_days`.
pub fn calculate_yearly_yield_from_accumulated(
    period_days: u32,
    accumulated_yield: &BigDecimal,
) -> BigDecimal {
    if period_days == 0 {
        return BigDecimal::zero();
    }
    div_decimal(accumulated_yield, &BigDecimal::from(period_days)) * &*DAYS_PER_YEAR
}
