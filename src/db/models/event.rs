use num_bigint::BigInt;

use crate::db::{entity_id, models::Protocol};

/// Canonical pool event, produced by the per-dialect normalizers.
///
/// Amounts are raw token units, signed from the pool's perspective:
/// positive = tokens flow INTO the pool, negative = tokens flow OUT.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEvent {
    pub chain_id: u64,
    /// Pool contract address (V4: the pool id)
    pub pool_address: String,
    pub block_number: u64,
    pub log_index: u32,
    /// Unix seconds
    pub timestamp: i64,
    pub kind: PoolEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoolEventKind {
    /// Pool discovered through a factory (or V4 PoolManager)
    Created {
        protocol: Protocol,
        factory: String,
        token0: String,
        token1: String,
        fee: Option<u32>,
        tick_spacing: Option<i32>,
        hooks: Option<String>,
        /// V4 pools are created already initialized
        initial_price: Option<(String, i32)>,
    },
    Initialize {
        sqrt_price_x96: String,
        tick: i32,
    },
    Swap {
        amount0: BigInt,
        amount1: BigInt,
        sqrt_price_x96: Option<String>,
        tick: Option<i32>,
        /// Dynamic fee reported by the swap itself (V4), in ppm
        fee: Option<u32>,
    },
    /// Mint, burn or collect with explicit token amounts
    Liquidity { amount0: BigInt, amount1: BigInt },
    /// V4 liquidity change; amounts depend on the pool's current tick
    RangeLiquidity {
        liquidity_delta: BigInt,
        tick_lower: i32,
        tick_upper: i32,
    },
    FeeChange { fee: u32 },
    TickSpacingChange { tick_spacing: i32 },
    PluginChange { plugin: String },
    PluginConfigChange { plugin_config: u8 },
}

impl PoolEvent {
    pub fn pool_id(&self) -> String {
        entity_id(self.chain_id, &self.pool_address)
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            PoolEventKind::Created { .. } => "created",
            PoolEventKind::Initialize { .. } => "initialize",
            PoolEventKind::Swap { .. } => "swap",
            PoolEventKind::Liquidity { .. } => "liquidity",
            PoolEventKind::RangeLiquidity { .. } => "range_liquidity",
            PoolEventKind::FeeChange { .. } => "fee_change",
            PoolEventKind::TickSpacingChange { .. } => "tick_spacing_change",
            PoolEventKind::PluginChange { .. } => "plugin_change",
            PoolEventKind::PluginConfigChange { .. } => "plugin_config_change",
        }
    }
}
