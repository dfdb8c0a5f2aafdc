use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::{
    commons::{FlowResult, SwapFees, SwapVolume},
    db::models::Pool,
    utils::{SECONDS_PER_DAY, SECONDS_PER_HOUR},
};

/// Bucket width of a snapshot series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotInterval {
    Hourly,
    Daily,
}

impl SnapshotInterval {
    pub fn width_seconds(&self) -> i64 {
        match self {
            SnapshotInterval::Hourly => SECONDS_PER_HOUR,
            SnapshotInterval::Daily => SECONDS_PER_DAY,
        }
    }
}

/// Period aggregate of a pool (PoolHourlyData / PoolDailyData).
///
/// Primary Key: "{pool_id}-{bucket_index}" within its interval.
/// Buckets are anchored to the pool's creation time, not to epoch boundaries.
///
/// Population: created by the first event of a bucket, then mutated
/// additively by each later event in the same bucket. Never deleted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PoolSnapshot {
    pub id: String,
    pub pool_id: String,
    pub interval: SnapshotInterval,
    pub bucket_index: i64,
    pub period_start_timestamp: i64,

    // Period metrics (additive)
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub fees_token0: BigDecimal,
    pub fees_token1: BigDecimal,
    pub fees_usd: BigDecimal,
    pub inflow_usd: BigDecimal,
    pub outflow_usd: BigDecimal,
    pub net_inflow_usd: BigDecimal,
    pub swap_count: u64,

    // Liquidity state
    pub opening_total_value_locked_usd: BigDecimal,
    pub total_value_locked_token0: BigDecimal,
    pub total_value_locked_token1: BigDecimal,
    pub total_value_locked_usd: BigDecimal,

    // Yields (percent)
    pub accumulated_yield: BigDecimal,
    pub yearly_yield: BigDecimal,
}

impl PoolSnapshot {
    pub fn new(
        id: String,
        pool: &Pool,
        interval: SnapshotInterval,
        bucket_index: i64,
        opening_total_value_locked_usd: BigDecimal,
    ) -> Self {
        Self {
            id,
            pool_id: pool.id.clone(),
            interval,
            bucket_index,
            period_start_timestamp: pool.created_at_timestamp
                + bucket_index * interval.width_seconds(),
            volume_token0: BigDecimal::default(),
            volume_token1: BigDecimal::default(),
            volume_usd: BigDecimal::default(),
            fees_token0: BigDecimal::default(),
            fees_token1: BigDecimal::default(),
            fees_usd: BigDecimal::default(),
            inflow_usd: BigDecimal::default(),
            outflow_usd: BigDecimal::default(),
            net_inflow_usd: BigDecimal::default(),
            swap_count: 0,
            total_value_locked_token0: BigDecimal::default(),
            total_value_locked_token1: BigDecimal::default(),
            total_value_locked_usd: opening_total_value_locked_usd.clone(),
            opening_total_value_locked_usd,
            accumulated_yield: BigDecimal::default(),
            yearly_yield: BigDecimal::default(),
        }
    }

    pub fn add_flows(&mut self, flows: &FlowResult) {
        self.inflow_usd += flows.inflow_usd.clone();
        self.outflow_usd += flows.outflow_usd.clone();
        self.net_inflow_usd += flows.net_inflow_usd.clone();
    }

    pub fn add_swap(&mut self, volume: &SwapVolume, fees: &SwapFees) {
        self.volume_token0 += volume.volume_token0.clone();
        self.volume_token1 += volume.volume_token1.clone();
        self.volume_usd += volume.volume_usd.clone();
        self.fees_token0 += fees.fee_token0.clone();
        self.fees_token1 += fees.fee_token1.clone();
        self.fees_usd += fees.fees_usd.clone();
        self.swap_count += 1;
    }

    /// Overwrite the point-in-time fields with the pool's current state.
    pub fn close_with(&mut self, pool: &Pool) {
        self.total_value_locked_token0 = pool.total_value_locked_token0.clone();
        self.total_value_locked_token1 = pool.total_value_locked_token1.clone();
        self.total_value_locked_usd = pool.total_value_locked_usd.clone();
        self.accumulated_yield = pool.accumulated_yield.clone();
    }
}
