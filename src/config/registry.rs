use rustc_hash::FxHashMap;

use crate::{
    config::Settings,
    db::models::{ChainTokens, NativeTokenMetadata, Protocol, Token},
    error::DomainError,
    utils::ZERO_ADDRESS,
};

/// Static configuration of one supported chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_urls: Vec<String>,
    pub tokens: ChainTokens,
    pub native_token: NativeTokenMetadata,
}

/// Chains and protocol deployments known to the engine.
///
/// Built once at startup and shared by handle. Lookups for anything not
/// configured fail with a [`DomainError`] instead of defaulting.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: FxHashMap<u64, ChainConfig>,
    deployments: FxHashMap<(Protocol, u64), String>,
}

impl ChainRegistry {
    pub fn from_settings(settings: &Settings) -> Self {
        let chains = settings
            .chains
            .iter()
            .map(|chain| {
                let config = ChainConfig {
                    chain_id: chain.chain_id,
                    name: chain.name.clone(),
                    rpc_urls: chain.rpc_urls.clone(),
                    tokens: ChainTokens::new(
                        chain.wrapped_native_address.clone(),
                        chain.stablecoins.clone(),
                    ),
                    native_token: chain.native_token.clone(),
                };
                (chain.chain_id, config)
            })
            .collect();

        let deployments = settings
            .protocols
            .iter()
            .map(|d| ((d.protocol, d.chain_id), d.factory.to_lowercase()))
            .collect();

        Self {
            chains,
            deployments,
        }
    }

    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig, DomainError> {
        self.chains
            .get(&chain_id)
            .ok_or(DomainError::UnsupportedChain(chain_id))
    }

    pub fn chain_tokens(&self, chain_id: u64) -> Result<&ChainTokens, DomainError> {
        self.chain(chain_id).map(|c| &c.tokens)
    }

    /// The chain's native currency as a token at the zero address.
    pub fn native_token(&self, chain_id: u64) -> Result<Token, DomainError> {
        let metadata = &self.chain(chain_id)?.native_token;
        Ok(Token::new(
            chain_id,
            ZERO_ADDRESS,
            metadata.symbol.clone(),
            metadata.name.clone(),
            metadata.decimals,
        ))
    }

    /// Factory address (lowercase) of `protocol` on `chain_id`.
    pub fn deployment(&self, protocol: Protocol, chain_id: u64) -> Result<&str, DomainError> {
        self.deployments
            .get(&(protocol, chain_id))
            .map(String::as_str)
            .ok_or(DomainError::NotConfigured { protocol, chain_id })
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.chains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
