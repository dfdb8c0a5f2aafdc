use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::db::entity_id;

/// Token metadata and current USD price.
///
/// Primary Key: "{chain_id}-{address}"
/// Owned by the store; the engine only reads it. Prices are maintained
/// elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub id: String,
    pub chain_id: u64,
    pub address: String,

    pub symbol: String,
    pub name: String,
    pub decimals: u8,

    #[serde(default)]
    pub price_usd: BigDecimal,
    /// Unix seconds of the last price update, if known
    #[serde(default)]
    pub price_updated_at: Option<i64>,
}

impl Token {
    pub fn new(chain_id: u64, address: &str, symbol: String, name: String, decimals: u8) -> Self {
        Self {
            id: entity_id(chain_id, address),
            chain_id,
            // Always lowercase addresses for consistent comparisons
            address: address.to_lowercase(),
            symbol,
            name,
            decimals,
            price_usd: BigDecimal::default(),
            price_updated_at: None,
        }
    }

    pub fn with_price(mut self, price_usd: BigDecimal, updated_at: Option<i64>) -> Self {
        self.price_usd = price_usd;
        self.price_updated_at = updated_at;
        self
    }
}
