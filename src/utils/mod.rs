//! Utility functions for the accounting engine.
//!
//! - [`conversion`] - Integer/decimal conversions and rounding rules
//! - [`dates`] - Creation-anchored hourly/daily buckets
//! - [`tick_math`] - Liquidity delta to token amounts (V4)

mod conversion;
mod dates;
mod tick_math;

/// The Ethereum zero address, used as the native currency sentinel.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub use conversion::{
    div_decimal, f64_to_bigint, floor_div, hex_encode, i256_to_bigint, to_decimal,
    u256_to_bigint, DIVISION_SCALE,
};
pub(crate) use conversion::one_hundred;

pub use dates::{
    bucket_id, bucket_index, daily_bucket_id, get_bucket_ago, hourly_bucket_id,
    is_more_than_days_ago, is_more_than_hours_ago, snapshot_id, subtract_days, subtract_hours,
    BucketLookup, SECONDS_PER_DAY, SECONDS_PER_HOUR,
};

pub use tick_math::{amounts_for_liquidity_delta, tick_to_sqrt_price};
