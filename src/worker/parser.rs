//! Log parsing module.
//!
//! Decodes raw logs into typed protocol events keyed on topic0. Logs with an
//! unknown signature, or that fail to decode, are skipped.

use std::str::FromStr;

use alloy::{
    primitives::{Bytes, LogData, B256},
    sol_types::SolEvent,
};
use anyhow::Context;
use serde::Deserialize;

use crate::abis::{algebra, v2, v3, v4};

/// A log as delivered by the upstream feed, hex encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLog {
    pub chain_id: u64,
    pub address: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub block_number: u64,
    pub log_index: u32,
    /// Unix seconds
    pub block_timestamp: i64,
}

/// Position and origin of a decoded log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMeta {
    pub chain_id: u64,
    /// Emitting contract, lowercase
    pub address: String,
    pub block_number: u64,
    pub log_index: u32,
    pub block_timestamp: i64,
}

/// Decoded log, one variant per protocol dialect event.
///
/// Algebra pools share the V3 Initialize/Mint/Collect/Swap signatures, so
/// those decode into the V3 variants regardless of pool family.
pub enum ParsedLog {
    // Pool creation events
    V2PairCreated { event: v2::PairCreated, meta: LogMeta },
    V3PoolCreated { event: v3::PoolCreated, meta: LogMeta },
    AlgebraPool { event: algebra::Pool, meta: LogMeta },
    V4Initialize { event: v4::Initialize, meta: LogMeta },
    // Price initialization
    V3Initialize { event: v3::Initialize, meta: LogMeta },
    // Liquidity events
    V2Mint { event: v2::Mint, meta: LogMeta },
    V2Burn { event: v2::Burn, meta: LogMeta },
    V3Mint { event: v3::Mint, meta: LogMeta },
    V3Collect { event: v3::Collect, meta: LogMeta },
    V4ModifyLiquidity { event: v4::ModifyLiquidity, meta: LogMeta },
    // Swap events
    V2Swap { event: v2::Swap, meta: LogMeta },
    V3Swap { event: v3::Swap, meta: LogMeta },
    V4Swap { event: v4::Swap, meta: LogMeta },
    // Algebra configuration events
    AlgebraFee { event: algebra::Fee, meta: LogMeta },
    AlgebraTickSpacing { event: algebra::TickSpacing, meta: LogMeta },
    AlgebraPlugin { event: algebra::Plugin, meta: LogMeta },
    AlgebraPluginConfig { event: algebra::PluginConfig, meta: LogMeta },
}

/// Result of parsing a batch of raw logs.
pub struct ParseResult {
    /// Decoded logs in input order
    pub parsed_logs: Vec<ParsedLog>,
    /// Logs with an unknown signature or undecodable payload
    pub skipped: usize,
}

/// Decode one raw log.
///
/// Returns `Ok(None)` for logs this engine does not handle and an error when
/// the hex encoding itself is malformed.
pub fn parse_log(raw: &RawLog) -> anyhow::Result<Option<ParsedLog>> {
    let topics = raw
        .topics
        .iter()
        .map(|t| B256::from_str(t).with_context(|| format!("Invalid topic {}", t)))
        .collect::<anyhow::Result<Vec<B256>>>()?;

    let data = if raw.data.is_empty() {
        Bytes::new()
    } else {
        Bytes::from_str(&raw.data).with_context(|| format!("Invalid log data for {}", raw.address))?
    };

    let log_data = LogData::new_unchecked(topics, data);
    let Some(topic0) = log_data.topics().first() else {
        return Ok(None);
    };

    let meta = LogMeta {
        chain_id: raw.chain_id,
        address: raw.address.to_lowercase(),
        block_number: raw.block_number,
        log_index: raw.log_index,
        block_timestamp: raw.block_timestamp,
    };

    let parsed = match topic0 {
        // Pool creation events
        t if t == &v2::PairCreated::SIGNATURE_HASH => v2::PairCreated::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V2PairCreated { event, meta }),
        t if t == &v3::PoolCreated::SIGNATURE_HASH => v3::PoolCreated::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V3PoolCreated { event, meta }),
        t if t == &algebra::Pool::SIGNATURE_HASH => algebra::Pool::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::AlgebraPool { event, meta }),
        t if t == &v4::Initialize::SIGNATURE_HASH => v4::Initialize::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V4Initialize { event, meta }),
        t if t == &v3::Initialize::SIGNATURE_HASH => v3::Initialize::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V3Initialize { event, meta }),
        // Liquidity events
        t if t == &v2::Mint::SIGNATURE_HASH => v2::Mint::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V2Mint { event, meta }),
        t if t == &v2::Burn::SIGNATURE_HASH => v2::Burn::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V2Burn { event, meta }),
        t if t == &v3::Mint::SIGNATURE_HASH => v3::Mint::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V3Mint { event, meta }),
        t if t == &v3::Collect::SIGNATURE_HASH => v3::Collect::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V3Collect { event, meta }),
        t if t == &v4::ModifyLiquidity::SIGNATURE_HASH => {
            v4::ModifyLiquidity::decode_log_data(&log_data)
                .ok()
                .map(|event| ParsedLog::V4ModifyLiquidity { event, meta })
        },
        // Swap events
        t if t == &v2::Swap::SIGNATURE_HASH => v2::Swap::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V2Swap { event, meta }),
        t if t == &v3::Swap::SIGNATURE_HASH => v3::Swap::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V3Swap { event, meta }),
        t if t == &v4::Swap::SIGNATURE_HASH => v4::Swap::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::V4Swap { event, meta }),
        // Algebra configuration events
        t if t == &algebra::Fee::SIGNATURE_HASH => algebra::Fee::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::AlgebraFee { event, meta }),
        t if t == &algebra::TickSpacing::SIGNATURE_HASH => {
            algebra::TickSpacing::decode_log_data(&log_data)
                .ok()
                .map(|event| ParsedLog::AlgebraTickSpacing { event, meta })
        },
        t if t == &algebra::Plugin::SIGNATURE_HASH => algebra::Plugin::decode_log_data(&log_data)
            .ok()
            .map(|event| ParsedLog::AlgebraPlugin { event, meta }),
        t if t == &algebra::PluginConfig::SIGNATURE_HASH => {
            algebra::PluginConfig::decode_log_data(&log_data)
                .ok()
                .map(|event| ParsedLog::AlgebraPluginConfig { event, meta })
        },
        _ => None,
    };

    Ok(parsed)
}

/// Decode a batch of raw logs, keeping their order.
///
/// Malformed logs are skipped like unknown ones so one bad entry does not
/// stop a replay.
pub fn parse_logs<'a>(logs: impl IntoIterator<Item = &'a RawLog>) -> ParseResult {
    let mut parsed_logs = Vec::new();
    let mut skipped = 0;

    for raw in logs {
        match parse_log(raw) {
            Ok(Some(parsed)) => parsed_logs.push(parsed),
            Ok(None) => skipped += 1,
            Err(e) => {
                log::debug!(
                    "Skipping malformed log {}:{}: {:#}",
                    raw.block_number,
                    raw.log_index,
                    e
                );
                skipped += 1;
            },
        }
    }

    ParseResult {
        parsed_logs,
        skipped,
    }
}

/// Encode decoded log data back into the raw feed shape.
#[cfg(test)]
pub(crate) fn raw_log_from(
    address: &str,
    log_data: &LogData,
    block_number: u64,
    log_index: u32,
    block_timestamp: i64,
) -> RawLog {
    RawLog {
        chain_id: 1,
        address: address.to_string(),
        topics: log_data
            .topics()
            .iter()
            .map(|t| crate::utils::hex_encode(t.as_slice()))
            .collect(),
        data: crate::utils::hex_encode(&log_data.data),
        block_number,
        log_index,
        block_timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hex_encode;
    use alloy::primitives::{aliases::I24, Address, I256, U160};

    #[test]
    fn test_parse_v3_swap() {
        let event = v3::Swap {
            sender: Address::repeat_byte(1),
            recipient: Address::repeat_byte(2),
            amount0: I256::try_from(-500i64).unwrap(),
            amount1: I256::try_from(1_000i64).unwrap(),
            sqrtPriceX96: U160::from(79228162514264337593543950336u128),
            liquidity: 10_000,
            tick: I24::try_from(-3i32).unwrap(),
        };
        let raw = raw_log_from("0xABCDEF", &event.encode_log_data(), 10, 4, 1_700_000_000);

        let parsed = parse_log(&raw).unwrap().unwrap();
        let ParsedLog::V3Swap { event: decoded, meta } = parsed else {
            panic!("expected a V3 swap");
        };
        assert_eq!(decoded.amount0, event.amount0);
        assert_eq!(decoded.tick, event.tick);
        assert_eq!(meta.address, "0xabcdef");
        assert_eq!(meta.log_index, 4);
    }

    #[test]
    fn test_parse_algebra_fee() {
        let event = algebra::Fee { fee: 500 };
        let raw = raw_log_from("0xpool", &event.encode_log_data(), 1, 0, 0);
        assert!(matches!(
            parse_log(&raw).unwrap(),
            Some(ParsedLog::AlgebraFee { event, .. }) if event.fee == 500
        ));
    }

    #[test]
    fn test_unknown_signature_is_skipped() {
        let raw = RawLog {
            chain_id: 1,
            address: "0xpool".to_string(),
            topics: vec![hex_encode(B256::repeat_byte(7).as_slice())],
            data: String::new(),
            block_number: 1,
            log_index: 0,
            block_timestamp: 0,
        };
        assert!(parse_log(&raw).unwrap().is_none());
    }

    #[test]
    fn test_malformed_hex_is_an_error() {
        let raw = RawLog {
            chain_id: 1,
            address: "0xpool".to_string(),
            topics: vec!["0xnothex".to_string()],
            data: String::new(),
            block_number: 1,
            log_index: 0,
            block_timestamp: 0,
        };
        assert!(parse_log(&raw).is_err());

        let result = parse_logs([&raw]);
        assert!(result.parsed_logs.is_empty());
        assert_eq!(result.skipped, 1);
    }
}
