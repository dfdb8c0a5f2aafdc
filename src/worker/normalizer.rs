//! Normalize decoded protocol logs into [`PoolEvent`]s.
//!
//! Each dialect is mapped onto the pool-perspective sign convention:
//! positive amounts flow into the pool.
//!
//! - V2 swaps report gross in/out legs; the net is `in - out`.
//! - V3 and Algebra swaps already report pool deltas.
//! - V4 swaps report the caller's balance delta and are negated.
//! - V4 liquidity changes carry a liquidity delta; token amounts are resolved
//!   against the pool's tick when the event is processed.

use num_bigint::BigInt;

use crate::{
    db::models::{PoolEvent, PoolEventKind, Protocol},
    utils::{hex_encode, i256_to_bigint, u256_to_bigint},
    worker::parser::{LogMeta, ParsedLog},
};

fn event_at(meta: LogMeta, pool_address: String, kind: PoolEventKind) -> PoolEvent {
    PoolEvent {
        chain_id: meta.chain_id,
        pool_address,
        block_number: meta.block_number,
        log_index: meta.log_index,
        timestamp: meta.block_timestamp,
        kind,
    }
}

/// Event emitted by the pool contract itself.
fn pool_event(meta: LogMeta, kind: PoolEventKind) -> PoolEvent {
    let pool_address = meta.address.clone();
    event_at(meta, pool_address, kind)
}

/// Pool creation emitted by a factory; the factory is the log's address.
fn created_event(
    meta: LogMeta,
    pool_address: String,
    protocol: Protocol,
    token0: String,
    token1: String,
) -> PoolEvent {
    let factory = meta.address.clone();
    event_at(
        meta,
        pool_address,
        PoolEventKind::Created {
            protocol,
            factory,
            token0,
            token1,
            fee: None,
            tick_spacing: None,
            hooks: None,
            initial_price: None,
        },
    )
}

pub fn normalize(log: ParsedLog) -> PoolEvent {
    match log {
        ParsedLog::V2PairCreated { event, meta } => created_event(
            meta,
            hex_encode(event.pair.as_slice()),
            Protocol::UniswapV2,
            hex_encode(event.token0.as_slice()),
            hex_encode(event.token1.as_slice()),
        ),
        ParsedLog::V3PoolCreated { event, meta } => {
            let mut created = created_event(
                meta,
                hex_encode(event.pool.as_slice()),
                Protocol::UniswapV3,
                hex_encode(event.token0.as_slice()),
                hex_encode(event.token1.as_slice()),
            );
            if let PoolEventKind::Created {
                fee, tick_spacing, ..
            } = &mut created.kind
            {
                *fee = Some(event.fee.to::<u32>());
                *tick_spacing = Some(event.tickSpacing.as_i32());
            }
            created
        },
        ParsedLog::AlgebraPool { event, meta } => created_event(
            meta,
            hex_encode(event.pool.as_slice()),
            Protocol::Algebra,
            hex_encode(event.token0.as_slice()),
            hex_encode(event.token1.as_slice()),
        ),
        // V4 pools live in the PoolManager; the pool id stands in for the address
        ParsedLog::V4Initialize { event, meta } => {
            let mut created = created_event(
                meta,
                hex_encode(event.id.as_slice()),
                Protocol::UniswapV4,
                hex_encode(event.currency0.as_slice()),
                hex_encode(event.currency1.as_slice()),
            );
            if let PoolEventKind::Created {
                fee,
                tick_spacing,
                hooks,
                initial_price,
                ..
            } = &mut created.kind
            {
                *fee = Some(event.fee.to::<u32>());
                *tick_spacing = Some(event.tickSpacing.as_i32());
                *hooks = Some(hex_encode(event.hooks.as_slice()));
                *initial_price = Some((event.sqrtPriceX96.to_string(), event.tick.as_i32()));
            }
            created
        },
        ParsedLog::V3Initialize { event, meta } => pool_event(
            meta,
            PoolEventKind::Initialize {
                sqrt_price_x96: event.sqrtPriceX96.to_string(),
                tick: event.tick.as_i32(),
            },
        ),
        ParsedLog::V2Mint { event, meta } => pool_event(
            meta,
            PoolEventKind::Liquidity {
                amount0: u256_to_bigint(event.amount0),
                amount1: u256_to_bigint(event.amount1),
            },
        ),
        ParsedLog::V2Burn { event, meta } => pool_event(
            meta,
            PoolEventKind::Liquidity {
                amount0: -u256_to_bigint(event.amount0),
                amount1: -u256_to_bigint(event.amount1),
            },
        ),
        ParsedLog::V3Mint { event, meta } => pool_event(
            meta,
            PoolEventKind::Liquidity {
                amount0: u256_to_bigint(event.amount0),
                amount1: u256_to_bigint(event.amount1),
            },
        ),
        // Burn only credits the position; tokens leave the pool on Collect
        ParsedLog::V3Collect { event, meta } => pool_event(
            meta,
            PoolEventKind::Liquidity {
                amount0: -BigInt::from(event.amount0),
                amount1: -BigInt::from(event.amount1),
            },
        ),
        ParsedLog::V4ModifyLiquidity { event, meta } => event_at(
            meta,
            hex_encode(event.id.as_slice()),
            PoolEventKind::RangeLiquidity {
                liquidity_delta: i256_to_bigint(event.liquidityDelta),
                tick_lower: event.tickLower.as_i32(),
                tick_upper: event.tickUpper.as_i32(),
            },
        ),
        ParsedLog::V2Swap { event, meta } => pool_event(
            meta,
            PoolEventKind::Swap {
                amount0: u256_to_bigint(event.amount0In) - u256_to_bigint(event.amount0Out),
                amount1: u256_to_bigint(event.amount1In) - u256_to_bigint(event.amount1Out),
                sqrt_price_x96: None,
                tick: None,
                fee: None,
            },
        ),
        ParsedLog::V3Swap { event, meta } => pool_event(
            meta,
            PoolEventKind::Swap {
                amount0: i256_to_bigint(event.amount0),
                amount1: i256_to_bigint(event.amount1),
                sqrt_price_x96: Some(event.sqrtPriceX96.to_string()),
                tick: Some(event.tick.as_i32()),
                fee: None,
            },
        ),
        ParsedLog::V4Swap { event, meta } => event_at(
            meta,
            hex_encode(event.id.as_slice()),
            PoolEventKind::Swap {
                amount0: -BigInt::from(event.amount0),
                amount1: -BigInt::from(event.amount1),
                sqrt_price_x96: Some(event.sqrtPriceX96.to_string()),
                tick: Some(event.tick.as_i32()),
                fee: Some(event.fee.to::<u32>()),
            },
        ),
        ParsedLog::AlgebraFee { event, meta } => pool_event(
            meta,
            PoolEventKind::FeeChange {
                fee: u32::from(event.fee),
            },
        ),
        ParsedLog::AlgebraTickSpacing { event, meta } => pool_event(
            meta,
            PoolEventKind::TickSpacingChange {
                tick_spacing: event.newTickSpacing.as_i32(),
            },
        ),
        ParsedLog::AlgebraPlugin { event, meta } => pool_event(
            meta,
            PoolEventKind::PluginChange {
                plugin: hex_encode(event.newPluginAddress.as_slice()),
            },
        ),
        ParsedLog::AlgebraPluginConfig { event, meta } => pool_event(
            meta,
            PoolEventKind::PluginConfigChange {
                plugin_config: event.newPluginConfig,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abis::{v2, v4},
        worker::parser::{parse_log, raw_log_from},
    };
    use alloy::{
        primitives::{aliases::I24, aliases::U24, Address, B256, U160, U256},
        sol_types::SolEvent,
    };

    fn normalize_encoded(address: &str, log_data: &alloy::primitives::LogData) -> PoolEvent {
        let raw = raw_log_from(address, log_data, 100, 2, 1_700_000_000);
        normalize(parse_log(&raw).unwrap().unwrap())
    }

    #[test]
    fn test_v2_swap_nets_in_and_out() {
        let event = v2::Swap {
            sender: Address::repeat_byte(1),
            amount0In: U256::from(1_000u64),
            amount1In: U256::ZERO,
            amount0Out: U256::ZERO,
            amount1Out: U256::from(2_500u64),
            to: Address::repeat_byte(2),
        };
        let normalized = normalize_encoded("0xpair", &event.encode_log_data());

        assert_eq!(normalized.pool_address, "0xpair");
        assert_eq!(normalized.timestamp, 1_700_000_000);
        assert_eq!(
            normalized.kind,
            PoolEventKind::Swap {
                amount0: BigInt::from(1_000),
                amount1: BigInt::from(-2_500),
                sqrt_price_x96: None,
                tick: None,
                fee: None,
            }
        );
    }

    #[test]
    fn test_v2_burn_is_outflow() {
        let event = v2::Burn {
            sender: Address::repeat_byte(1),
            amount0: U256::from(7u64),
            amount1: U256::from(9u64),
            to: Address::repeat_byte(2),
        };
        let normalized = normalize_encoded("0xpair", &event.encode_log_data());
        assert_eq!(
            normalized.kind,
            PoolEventKind::Liquidity {
                amount0: BigInt::from(-7),
                amount1: BigInt::from(-9),
            }
        );
    }

    #[test]
    fn test_v4_swap_is_negated_and_keyed_by_pool_id() {
        let id = B256::repeat_byte(0xab);
        let event = v4::Swap {
            id,
            sender: Address::repeat_byte(1),
            amount0: -1_000,
            amount1: 3_000,
            sqrtPriceX96: U160::from(1u64),
            liquidity: 1,
            tick: I24::try_from(10i32).unwrap(),
            fee: U24::from(500u32),
        };
        let normalized = normalize_encoded("0xmanager", &event.encode_log_data());

        assert_eq!(normalized.pool_address, hex_encode(id.as_slice()));
        assert_eq!(
            normalized.kind,
            PoolEventKind::Swap {
                amount0: BigInt::from(1_000),
                amount1: BigInt::from(-3_000),
                sqrt_price_x96: Some("1".to_string()),
                tick: Some(10),
                fee: Some(500),
            }
        );
    }

    #[test]
    fn test_v4_initialize_creates_pool() {
        let event = v4::Initialize {
            id: B256::repeat_byte(0x01),
            currency0: Address::ZERO,
            currency1: Address::repeat_byte(0x22),
            fee: U24::from(3000u32),
            tickSpacing: I24::try_from(60i32).unwrap(),
            hooks: Address::ZERO,
            sqrtPriceX96: U160::from(42u64),
            tick: I24::try_from(-7i32).unwrap(),
        };
        let normalized = normalize_encoded("0xManager", &event.encode_log_data());

        let PoolEventKind::Created {
            protocol,
            factory,
            token0,
            fee,
            tick_spacing,
            initial_price,
            ..
        } = normalized.kind
        else {
            panic!("expected a creation event");
        };
        assert_eq!(protocol, Protocol::UniswapV4);
        assert_eq!(factory, "0xmanager");
        assert_eq!(token0, crate::utils::ZERO_ADDRESS);
        assert_eq!(fee, Some(3000));
        assert_eq!(tick_spacing, Some(60));
        assert_eq!(initial_price, Some(("42".to_string(), -7)));
    }
}
