use serde::Deserialize;

use crate::utils::ZERO_ADDRESS;

/// Token classification data for one chain.
///
/// Addresses are stored lowercase; every lookup lowercases its input, so
/// callers may pass checksummed addresses.
#[derive(Debug, Clone, Default)]
pub struct ChainTokens {
    pub wrapped_native_token: String,
    pub stablecoins: Vec<String>,
}

impl ChainTokens {
    pub fn new(wrapped_native_token: String, stablecoins: Vec<String>) -> Self {
        Self {
            wrapped_native_token: wrapped_native_token.to_lowercase(),
            stablecoins: stablecoins.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn is_wrapped_native(&self, token: &str) -> bool {
        self.wrapped_native_token == token.to_lowercase()
    }

    /// The wrapped native token is never a stablecoin, even if listed as one.
    pub fn is_stable(&self, token: &str) -> bool {
        let token_lower = token.to_lowercase();
        if self.is_wrapped_native(&token_lower) {
            return false;
        }
        self.stablecoins.iter().any(|s| *s == token_lower)
    }

    /// The native currency is represented by the zero address on every chain.
    pub fn is_native(token: &str) -> bool {
        token.to_lowercase() == ZERO_ADDRESS
    }
}

/// Metadata of a chain's native currency (ETH, MATIC, ...).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NativeTokenMetadata {
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_ignore_case() {
        let tokens = ChainTokens::new(
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(),
            vec!["0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string()],
        );

        assert!(tokens.is_wrapped_native("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert!(tokens.is_stable("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
        assert!(tokens.is_stable("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48"));
        assert!(!tokens.is_stable("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert!(ChainTokens::is_native(ZERO_ADDRESS));
        assert!(!ChainTokens::is_native("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
    }

    #[test]
    fn test_wrapped_native_listed_as_stable_is_not_stable() {
        let weth = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
        let usdc = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
        let stablecoins = vec![usdc.to_string(), weth.to_uppercase()];
        let tokens = ChainTokens::new(weth.to_string(), stablecoins);

        assert!(tokens.is_stable(usdc));
        assert!(!tokens.is_stable(weth));
        assert!(tokens.is_wrapped_native(weth));
    }
}
