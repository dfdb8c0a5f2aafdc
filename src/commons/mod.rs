//! Pure accounting primitives shared by every protocol dialect.
//!
//! - [`tokens`] - Stablecoin / native classification and pool lookups
//! - [`flows`] - Inflow, outflow, volume and fee attribution
//! - [`yields`] - Fee yield annualization

pub mod flows;
pub mod tokens;
pub mod yields;

pub use flows::{
    get_liquidity_inflow_and_outflow_from_raw_amounts, get_raw_fee_from_token_amount,
    get_swap_fees_from_raw_amounts, get_swap_volume, get_swap_volume_from_amounts,
    get_v2_swap_volume_from_amounts, FlowResult, SwapFees, SwapVolume,
};
pub use tokens::{
    classify_pool, find_native_token, find_stable_token, find_wrapped_native,
    get_token_amount_in_pool, is_native, is_native_pool, is_stable, is_stable_pool,
    is_variable_with_stable_pool, is_wrapped_native, is_wrapped_native_pool,
};
pub use yields::{
    calculate_day_yearly_yield, calculate_fee_yield, calculate_hour_yearly_yield,
    calculate_yearly_yield_from_accumulated,
};
