use std::fmt;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::{
    commons::{FlowResult, SwapFees, SwapVolume},
    db::{entity_id, models::Token},
};

/// Supported pool dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    UniswapV2,
    UniswapV3,
    /// Algebra Integral: V3 math with dynamic fees and plugins
    Algebra,
    UniswapV4,
}

/// Which swap leg counts as trading volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeConvention {
    /// Positive ("into pool") legs, used by concentrated liquidity pools
    InflowLeg,
    /// Negative ("out of pool") legs, used by constant product pairs
    OutflowLeg,
}

impl Protocol {
    pub fn volume_convention(&self) -> VolumeConvention {
        match self {
            Protocol::UniswapV2 => VolumeConvention::OutflowLeg,
            Protocol::UniswapV3 | Protocol::Algebra | Protocol::UniswapV4 => {
                VolumeConvention::InflowLeg
            },
        }
    }

    /// Fee used when the creation event carries none.
    /// V2 standard fee: 0.3% = 3000 ppm.
    pub fn default_fee(&self) -> u32 {
        match self {
            Protocol::UniswapV2 => 3000,
            _ => 0,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::UniswapV2 => "uniswap_v2",
            Protocol::UniswapV3 => "uniswap_v3",
            Protocol::Algebra => "algebra",
            Protocol::UniswapV4 => "uniswap_v4",
        };
        f.write_str(name)
    }
}

/// Composition of a pool's token pair, decided once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolComposition {
    /// Both tokens are stablecoins
    Stable,
    /// Exactly one token is a stablecoin
    VariableWithStable,
    /// At least one side is the native currency (zero address)
    Native,
    /// At least one side is the wrapped native token
    WrappedNative,
    Other,
}

/// Liquidity pool state and lifetime totals.
///
/// Primary Key: "{chain_id}-{address}"
///
/// TVL token fields only move by net inflow; they are never overwritten.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pool {
    pub id: String,
    pub chain_id: u64,
    pub address: String,
    pub protocol: Protocol,

    // Token ids
    pub token0: String,
    pub token1: String,

    pub composition: PoolComposition,
    pub stable_token: Option<String>,

    /// Unix seconds, immutable
    pub created_at_timestamp: i64,

    // Protocol state
    /// Current fee in ppm (1_000_000 = 100%)
    pub fee: u32,
    pub tick: Option<i32>,
    pub tick_spacing: Option<i32>,
    pub sqrt_price_x96: Option<String>,
    pub hooks: Option<String>,
    pub plugin: Option<String>,
    pub plugin_config: Option<u8>,

    // TVL
    pub total_value_locked_token0: BigDecimal,
    pub total_value_locked_token1: BigDecimal,
    pub total_value_locked_usd: BigDecimal,

    // Lifetime stats
    pub total_volume_token0: BigDecimal,
    pub total_volume_token1: BigDecimal,
    pub total_volume_usd: BigDecimal,
    pub total_fees_token0: BigDecimal,
    pub total_fees_token1: BigDecimal,
    pub total_fees_usd: BigDecimal,
    pub total_inflow_usd: BigDecimal,
    pub total_outflow_usd: BigDecimal,
    pub swap_count: u64,

    // Yields (percent)
    pub accumulated_yield: BigDecimal,
    pub yearly_yield_24h: BigDecimal,
    pub yearly_yield_7d: BigDecimal,
    pub yearly_yield_30d: BigDecimal,

    // Latest snapshot ids, used to carry TVL into new buckets
    pub last_hourly_snapshot: Option<String>,
    pub last_daily_snapshot: Option<String>,
}

impl Pool {
    pub fn new(
        chain_id: u64,
        address: &str,
        protocol: Protocol,
        token0: &Token,
        token1: &Token,
        created_at_timestamp: i64,
    ) -> Self {
        Self {
            id: entity_id(chain_id, address),
            chain_id,
            address: address.to_lowercase(),
            protocol,
            token0: token0.id.clone(),
            token1: token1.id.clone(),
            composition: PoolComposition::Other,
            stable_token: None,
            created_at_timestamp,
            fee: protocol.default_fee(),
            tick: None,
            tick_spacing: None,
            sqrt_price_x96: None,
            hooks: None,
            plugin: None,
            plugin_config: None,
            total_value_locked_token0: BigDecimal::default(),
            total_value_locked_token1: BigDecimal::default(),
            total_value_locked_usd: BigDecimal::default(),
            total_volume_token0: BigDecimal::default(),
            total_volume_token1: BigDecimal::default(),
            total_volume_usd: BigDecimal::default(),
            total_fees_token0: BigDecimal::default(),
            total_fees_token1: BigDecimal::default(),
            total_fees_usd: BigDecimal::default(),
            total_inflow_usd: BigDecimal::default(),
            total_outflow_usd: BigDecimal::default(),
            swap_count: 0,
            accumulated_yield: BigDecimal::default(),
            yearly_yield_24h: BigDecimal::default(),
            yearly_yield_7d: BigDecimal::default(),
            yearly_yield_30d: BigDecimal::default(),
            last_hourly_snapshot: None,
            last_daily_snapshot: None,
        }
    }

    /// Move TVL by the event's net inflow and re-price it.
    pub fn apply_flows(&mut self, flows: &FlowResult, token0: &Token, token1: &Token) {
        self.total_value_locked_token0 += flows.net_inflow_token0.clone();
        self.total_value_locked_token1 += flows.net_inflow_token1.clone();
        self.total_inflow_usd += flows.inflow_usd.clone();
        self.total_outflow_usd += flows.outflow_usd.clone();
        self.refresh_tvl_usd(token0, token1);
    }

    /// Recompute TVL USD from the token balances and current token prices.
    pub fn refresh_tvl_usd(&mut self, token0: &Token, token1: &Token) {
        self.total_value_locked_usd = &self.total_value_locked_token0 * &token0.price_usd
            + &self.total_value_locked_token1 * &token1.price_usd;
    }

    pub fn apply_swap(&mut self, volume: &SwapVolume, fees: &SwapFees) {
        self.total_volume_token0 += volume.volume_token0.clone();
        self.total_volume_token1 += volume.volume_token1.clone();
        self.total_volume_usd += volume.volume_usd.clone();
        self.total_fees_token0 += fees.fee_token0.clone();
        self.total_fees_token1 += fees.fee_token1.clone();
        self.total_fees_usd += fees.fees_usd.clone();
        self.swap_count += 1;
    }

    /// V3/V4 swaps report the tick and price active after the swap.
    pub fn update_price_state(&mut self, tick: Option<i32>, sqrt_price_x96: Option<String>) {
        if tick.is_some() {
            self.tick = tick;
        }
        if sqrt_price_x96.is_some() {
            self.sqrt_price_x96 = sqrt_price_x96;
        }
    }
}
